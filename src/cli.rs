use crate::generator::generate_to_file;
use crate::watcher::ConfigWatcher;
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

/// Generate OpenAPI 3.0 documents from a YAML API config and Go struct declarations
#[derive(Parser, Debug)]
#[command(name = "openapi-from-go")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the YAML API config
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Path to the Go file declaring the request/response structs
    #[arg(short = 'g', long = "go-file", value_name = "FILE")]
    pub go_file: Option<PathBuf>,

    /// Output file path (defaults to openapi_gen_<timestamp>.json)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Watch a YAML config and re-validate it on every change
    #[arg(short = 'w', long = "watcher", value_name = "FILE")]
    pub watch_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// What a validated invocation will do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Generate {
        config: PathBuf,
        go_file: PathBuf,
        output: Option<PathBuf>,
    },
    Watch {
        config: PathBuf,
    },
}

impl CliArgs {
    /// Resolves the mutually exclusive modes.
    pub fn mode(&self) -> Result<Mode> {
        match (&self.config_path, &self.go_file, &self.watch_path) {
            (Some(config), Some(go_file), None) => Ok(Mode::Generate {
                config: config.clone(),
                go_file: go_file.clone(),
                output: self.output_path.clone(),
            }),
            (None, None, Some(config)) => {
                if self.output_path.is_some() {
                    anyhow::bail!("--output cannot be used with --watcher");
                }
                Ok(Mode::Watch {
                    config: config.clone(),
                })
            }
            (Some(_), None, None) => anyhow::bail!("--go-file is required with --config"),
            (None, Some(_), None) => anyhow::bail!("--config is required with --go-file"),
            (None, None, None) => anyhow::bail!(
                "Nothing to do: use --config <FILE> --go-file <FILE> to generate, \
                 or --watcher <FILE> to validate a config on change"
            ),
            _ => anyhow::bail!("--watcher cannot be combined with --config or --go-file"),
        }
    }
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    match args.mode()? {
        Mode::Generate {
            config,
            go_file,
            output,
        } => {
            for (label, path) in [("Config", &config), ("Go file", &go_file)] {
                if !path.is_file() {
                    anyhow::bail!("{} does not exist: {}", label, path.display());
                }
            }
            info!("Config: {}", config.display());
            info!("Go file: {}", go_file.display());
            match output {
                Some(output) => info!("Output file: {}", output.display()),
                None => info!("Output file: timestamped default"),
            }
        }
        Mode::Watch { config } => {
            if !config.is_file() {
                anyhow::bail!("Config does not exist: {}", config.display());
            }
            info!("Watching: {}", config.display());
        }
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    match args.mode()? {
        Mode::Generate {
            config,
            go_file,
            output,
        } => {
            info!("Starting OpenAPI document generation...");
            let written = generate_to_file(&config, &go_file, output.as_deref())
                .with_context(|| {
                    format!(
                        "Failed to generate OpenAPI document from {} and {}",
                        config.display(),
                        go_file.display()
                    )
                })?;
            println!("OpenAPI document written to {}", written.display());
            Ok(())
        }
        Mode::Watch { config } => {
            let mut watcher = ConfigWatcher::new(&config)
                .with_context(|| format!("Failed to watch {}", config.display()))?;
            watcher.run()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("openapi-from-go").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_generate_mode() {
        let args = parse(&["-c", "api.yml", "-g", "models.go", "-o", "out.json"]);

        assert_eq!(
            args.mode().unwrap(),
            Mode::Generate {
                config: PathBuf::from("api.yml"),
                go_file: PathBuf::from("models.go"),
                output: Some(PathBuf::from("out.json")),
            }
        );
    }

    #[test]
    fn test_watch_mode() {
        let args = parse(&["--watcher", "api.yml", "--verbose"]);

        assert!(args.verbose);
        assert_eq!(
            args.mode().unwrap(),
            Mode::Watch {
                config: PathBuf::from("api.yml")
            }
        );
    }

    #[test]
    fn test_invalid_mode_combinations() {
        assert!(parse(&[]).mode().is_err());
        assert!(parse(&["-c", "api.yml"]).mode().is_err());
        assert!(parse(&["-g", "models.go"]).mode().is_err());
        assert!(parse(&["-w", "api.yml", "-c", "api.yml"]).mode().is_err());
        assert!(parse(&["-w", "api.yml", "-o", "out.json"]).mode().is_err());
    }

    #[test]
    fn test_parse_args_rejects_missing_files() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("api.yml");
        fs::write(&config, "info: {}\n").unwrap();
        let missing = temp_dir.path().join("missing.go");

        let args = parse(&["-c", config.to_str().unwrap(), "-g", missing.to_str().unwrap()]);
        let err = parse_args_from_parsed(args).unwrap_err();

        assert!(err.to_string().contains("Go file does not exist"));
    }

    #[test]
    fn test_run_generate_writes_output() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("api.yml");
        let go_file = temp_dir.path().join("models.go");
        let output = temp_dir.path().join("openapi.json");
        fs::write(
            &config,
            "info:\n  title: T\n  version: v\npaths:\n  /ping:\n    get:\n      responses:\n        200:\n          description: pong\n          schema: Pong\n",
        )
        .unwrap();
        fs::write(&go_file, "package api\n\ntype Pong struct {\n    Ok bool `json:\"ok\"`\n}\n")
            .unwrap();

        let args = parse(&[
            "-c",
            config.to_str().unwrap(),
            "-g",
            go_file.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ]);
        run(parse_args_from_parsed(args).unwrap()).unwrap();

        let json = fs::read_to_string(&output).unwrap();
        assert!(json.contains("#/components/schemas/Pong"));
    }
}
