use std::path::Path;

use anyhow::Context;

use chartreg_server::{RegistryServer, ServerConfig};

use crate::cli::{Cli, Command, ServeArgs};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Serve(args) => serve(config, args),
        Command::Config(_) => print_config(&config),
    }
}

fn load_config(path: Option<&str>) -> anyhow::Result<ServerConfig> {
    match path {
        Some(path) => ServerConfig::load(Path::new(path))
            .with_context(|| format!("loading config from {path}")),
        None => Ok(ServerConfig::default()),
    }
}

fn serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime
        .block_on(RegistryServer::new(config).serve())
        .context("serving the registry")
}

fn print_config(config: &ServerConfig) -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_when_no_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config.listen, "127.0.0.1:5000");
    }

    #[test]
    fn missing_config_file_errors() {
        assert!(load_config(Some("/definitely/not/there.yaml")).is_err());
    }
}
