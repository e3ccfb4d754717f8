//! Pack and unpack chart archives.

use std::collections::BTreeMap;
use std::io::Read;

use flate2::read::GzDecoder;
use flate2::{Compression, GzBuilder};

use chartreg_types::ChartDescriptor;

use crate::bundle::{ChartBundle, ChartFile};
use crate::error::{ArchiveError, ArchiveResult};

/// Fixed gzip "extra" field stamped on every packed archive.
pub const GZIP_EXTRA: &[u8] = b"+aHR0cHM6Ly95b3V0dS5iZS96OVV6MWljandyTQo=";

/// Fixed gzip comment stamped on every packed archive.
pub const GZIP_COMMENT: &str = "Helm";

const DESCRIPTOR_FILE: &str = "Chart.yaml";
const VALUES_FILE: &str = "values.yaml";
const TEMPLATES_DIR: &str = "templates";
const CHARTS_DIR: &str = "charts";

/// Pack a chart bundle into gzip+tar bytes.
///
/// Entries are written descriptor, values, templates, files, then the
/// dependency subtrees, all with mode `0755`, so a repacked archive is
/// reproducible byte for byte.
pub fn pack(chart: &ChartBundle) -> ArchiveResult<Vec<u8>> {
    let gz = GzBuilder::new()
        .extra(GZIP_EXTRA)
        .comment(GZIP_COMMENT)
        .write(Vec::new(), Compression::default());
    let mut tar = tar::Builder::new(gz);
    write_tar_contents(&mut tar, chart, "")?;
    let gz = tar.into_inner()?;
    Ok(gz.finish()?)
}

fn write_tar_contents<W: std::io::Write>(
    out: &mut tar::Builder<W>,
    chart: &ChartBundle,
    prefix: &str,
) -> ArchiveResult<()> {
    let base = if prefix.is_empty() {
        chart.name().to_string()
    } else {
        format!("{prefix}/{}", chart.name())
    };

    let descriptor = serde_yaml::to_string(&chart.descriptor).map_err(|source| {
        ArchiveError::Yaml {
            name: format!("{base}/{DESCRIPTOR_FILE}"),
            source,
        }
    })?;
    write_entry(out, &format!("{base}/{DESCRIPTOR_FILE}"), descriptor.as_bytes())?;

    if !chart.values.is_empty() {
        write_entry(out, &format!("{base}/{VALUES_FILE}"), chart.values.as_bytes())?;
    }

    for template in &chart.templates {
        write_entry(out, &format!("{base}/{}", template.name), &template.data)?;
    }

    for file in &chart.files {
        write_entry(out, &format!("{base}/{}", file.name), &file.data)?;
    }

    for dep in &chart.dependencies {
        write_tar_contents(out, dep, &format!("{base}/{CHARTS_DIR}"))?;
    }
    Ok(())
}

fn write_entry<W: std::io::Write>(
    out: &mut tar::Builder<W>,
    name: &str,
    body: &[u8],
) -> ArchiveResult<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(body.len() as u64);
    header.set_mode(0o755);
    out.append_data(&mut header, name, body)?;
    Ok(())
}

/// Unpack gzip+tar bytes into a chart bundle.
///
/// Entry order is irrelevant; the layout is reassembled from the paths. The
/// archive must hold a single root directory carrying the chart, and every
/// chart subtree must contain a descriptor. Templates are carried verbatim,
/// never evaluated.
pub fn unpack(data: &[u8]) -> ArchiveResult<ChartBundle> {
    if data.len() < 2 || data[0..2] != [0x1f, 0x8b] {
        return Err(ArchiveError::NotGzip("missing gzip magic".to_string()));
    }
    let mut tar = tar::Archive::new(GzDecoder::new(data));

    let mut root: Option<String> = None;
    let mut entries: Vec<(Vec<String>, Vec<u8>)> = Vec::new();
    for entry in tar.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let mut segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            continue;
        }
        let first = segments.remove(0);
        match &root {
            None => root = Some(first),
            Some(existing) if *existing != first => {
                return Err(ArchiveError::Malformed(format!(
                    "entry {path} outside chart root {existing}"
                )))
            }
            Some(_) => {}
        }
        if segments.is_empty() {
            continue;
        }
        let mut body = Vec::new();
        entry.read_to_end(&mut body)?;
        entries.push((segments, body));
    }

    let root = root.ok_or_else(|| ArchiveError::Malformed("empty archive".to_string()))?;
    assemble(&root, entries)
}

/// Build a chart subtree from entries whose paths are relative to it.
fn assemble(path: &str, entries: Vec<(Vec<String>, Vec<u8>)>) -> ArchiveResult<ChartBundle> {
    let mut descriptor: Option<ChartDescriptor> = None;
    let mut values = String::new();
    let mut templates = Vec::new();
    let mut files = Vec::new();
    let mut dep_entries: BTreeMap<String, Vec<(Vec<String>, Vec<u8>)>> = BTreeMap::new();

    for (segments, body) in entries {
        match segments.as_slice() {
            [name] if name == DESCRIPTOR_FILE => {
                descriptor = Some(serde_yaml::from_slice(&body).map_err(|source| {
                    ArchiveError::Yaml {
                        name: format!("{path}/{DESCRIPTOR_FILE}"),
                        source,
                    }
                })?);
            }
            [name] if name == VALUES_FILE => {
                values = String::from_utf8_lossy(&body).into_owned();
            }
            [dir, ..] if dir == TEMPLATES_DIR => {
                templates.push(ChartFile::new(segments.join("/"), body));
            }
            [dir, dep, rest @ ..] if dir == CHARTS_DIR && !rest.is_empty() => {
                dep_entries
                    .entry(dep.clone())
                    .or_default()
                    .push((rest.to_vec(), body));
            }
            _ => {
                files.push(ChartFile::new(segments.join("/"), body));
            }
        }
    }

    let descriptor = descriptor.ok_or_else(|| ArchiveError::MissingDescriptor(path.to_string()))?;
    let mut chart = ChartBundle::new(descriptor);
    chart.values = values;
    chart.templates = templates;
    chart.files = files;
    for (dep, sub) in dep_entries {
        chart
            .dependencies
            .push(assemble(&format!("{path}/{CHARTS_DIR}/{dep}"), sub)?);
    }
    Ok(chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;

    fn sample_chart() -> ChartBundle {
        let mut descriptor = ChartDescriptor::new("web", "1.0.0");
        descriptor.description = Some("a web chart".into());
        let mut chart = ChartBundle::new(descriptor);
        chart.values = "replicaCount: 1\n".into();
        chart.templates.push(ChartFile::new(
            "templates/deployment.yaml",
            b"kind: Deployment\n".to_vec(),
        ));
        chart
            .files
            .push(ChartFile::new("README.md", b"readme\n".to_vec()));

        let mut dep = ChartBundle::new(ChartDescriptor::new("db", "0.3.0"));
        dep.values = "storage: 1Gi\n".into();
        dep.templates.push(ChartFile::new(
            "templates/statefulset.yaml",
            b"kind: StatefulSet\n".to_vec(),
        ));
        chart.dependencies.push(dep);
        chart
    }

    // -----------------------------------------------------------------------
    // Round trip
    // -----------------------------------------------------------------------

    #[test]
    fn pack_unpack_roundtrip() {
        let chart = sample_chart();
        let data = pack(&chart).unwrap();
        let back = unpack(&data).unwrap();
        assert_eq!(back.descriptor, chart.descriptor);
        assert_eq!(back.values, chart.values);
        assert_eq!(back.templates, chart.templates);
        assert_eq!(back.files, chart.files);
        assert_eq!(back.dependencies.len(), 1);
        assert_eq!(back.dependencies[0], chart.dependencies[0]);
    }

    #[test]
    fn repack_is_deterministic() {
        let chart = sample_chart();
        let first = pack(&chart).unwrap();
        let second = pack(&unpack(&first).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_values_entry_is_omitted() {
        let mut chart = sample_chart();
        chart.values.clear();
        let back = unpack(&pack(&chart).unwrap()).unwrap();
        assert!(back.values.is_empty());
    }

    // -----------------------------------------------------------------------
    // Gzip header convention
    // -----------------------------------------------------------------------

    #[test]
    fn packed_archive_carries_fixed_gzip_header() {
        let data = pack(&sample_chart()).unwrap();
        let mut decoder = GzDecoder::new(&data[..]);
        let mut sink = Vec::new();
        decoder.read_to_end(&mut sink).unwrap();
        let header = decoder.header().expect("gzip header");
        assert_eq!(header.extra(), Some(GZIP_EXTRA));
        assert_eq!(header.comment(), Some(GZIP_COMMENT.as_bytes()));
    }

    // -----------------------------------------------------------------------
    // Reader tolerance and rejection
    // -----------------------------------------------------------------------

    #[test]
    fn unpack_tolerates_any_entry_order() {
        // Hand-build an archive with values before the descriptor.
        let gz = GzBuilder::new().write(Vec::new(), Compression::default());
        let mut tar = tar::Builder::new(gz);
        write_entry(&mut tar, "web/values.yaml", b"a: 1\n").unwrap();
        write_entry(&mut tar, "web/templates/x.yaml", b"x\n").unwrap();
        write_entry(&mut tar, "web/Chart.yaml", b"name: web\nversion: 1.0.0\n").unwrap();
        let data = tar.into_inner().unwrap().finish().unwrap();

        let chart = unpack(&data).unwrap();
        assert_eq!(chart.name(), "web");
        assert_eq!(chart.values, "a: 1\n");
        assert_eq!(chart.templates.len(), 1);
    }

    #[test]
    fn unpack_rejects_non_gzip() {
        let err = unpack(b"definitely not gzip").unwrap_err();
        assert!(matches!(err, ArchiveError::NotGzip(_)));
    }

    #[test]
    fn unpack_rejects_missing_descriptor() {
        let gz = GzBuilder::new().write(Vec::new(), Compression::default());
        let mut tar = tar::Builder::new(gz);
        write_entry(&mut tar, "web/values.yaml", b"a: 1\n").unwrap();
        let data = tar.into_inner().unwrap().finish().unwrap();
        let err = unpack(&data).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingDescriptor(_)));
    }

    #[test]
    fn unpack_rejects_multiple_roots() {
        let gz = GzBuilder::new().write(Vec::new(), Compression::default());
        let mut tar = tar::Builder::new(gz);
        write_entry(&mut tar, "a/Chart.yaml", b"name: a\nversion: 1.0.0\n").unwrap();
        write_entry(&mut tar, "b/Chart.yaml", b"name: b\nversion: 1.0.0\n").unwrap();
        let data = tar.into_inner().unwrap().finish().unwrap();
        let err = unpack(&data).unwrap_err();
        assert!(matches!(err, ArchiveError::Malformed(_)));
    }

    #[test]
    fn unpack_requires_dependency_descriptor() {
        let gz = GzBuilder::new().write(Vec::new(), Compression::default());
        let mut tar = tar::Builder::new(gz);
        write_entry(&mut tar, "web/Chart.yaml", b"name: web\nversion: 1.0.0\n").unwrap();
        write_entry(&mut tar, "web/charts/db/values.yaml", b"a: 1\n").unwrap();
        let data = tar.into_inner().unwrap().finish().unwrap();
        let err = unpack(&data).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingDescriptor(_)));
    }

    #[test]
    fn tar_entries_carry_mode_0755() {
        let data = pack(&sample_chart()).unwrap();
        let mut tar = tar::Archive::new(GzDecoder::new(&data[..]));
        for entry in tar.entries().unwrap() {
            let entry = entry.unwrap();
            assert_eq!(entry.header().mode().unwrap() & 0o777, 0o755);
        }
    }
}
