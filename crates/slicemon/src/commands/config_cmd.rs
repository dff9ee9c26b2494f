//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

use super::util;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::resolve_path(global);

    match args.command {
        ConfigCommand::Init { force } => {
            if path.exists() {
                if !force {
                    return Err(CliError::ConfigExists {
                        path: path.display().to_string(),
                    });
                }
                let prompt = format!("Overwrite {}?", path.display());
                if !util::confirm(&prompt, global.yes)? {
                    return Ok(());
                }
            }

            config::save_config_to(&Config::default(), &path)?;
            output::print_status(
                &format!("Wrote default configuration to {}", path.display()),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_from(&path)?;
            let format = global.output.unwrap_or(OutputFormat::Table);
            let toml_text = toml::to_string_pretty(&cfg)?;
            let out = output::render_single(
                format,
                &cfg,
                |_| toml_text.trim_end().to_owned(),
                |_| toml_text.trim_end().to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
    }
}
