use anyhow::{Context, Result, bail};

pub mod asset_graph;
pub mod canonical;
pub mod cli;
pub mod config;
pub mod error;
pub mod expression;
pub mod foreign_str;
pub mod material_export;
pub mod resolve;
pub mod session;
pub mod suffix;
pub mod texture_export;
pub mod types;

use asset_graph::load_graph;
use cli::{Cli, Commands, ConfigCommands};
use config::{ExportConfig, load_config, save_config};
use foreign_str::NameReader;
use material_export::build_sidecar;
use session::ExportSession;
use suffix::SuffixClassifier;
use types::ClassifyOutput;

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Export {
            graph,
            objects,
            out,
            config,
            max_parent_depth,
            no_props,
        } => {
            let mut cfg = load_config(&config)?;
            if let Some(out) = out {
                cfg.out_dir = out;
            }
            if let Some(depth) = max_parent_depth {
                cfg.max_parent_depth = depth;
            }
            if no_props {
                cfg.write_props = false;
            }

            let graph = load_graph(&graph)?;
            let mut session = ExportSession::new(&graph, cfg);
            if objects.is_empty() {
                session.export_all_materials();
            } else {
                for name in &objects {
                    session.export_named(name)?;
                }
            }
            let report = session.finish();
            if !report.failures.is_empty() {
                eprintln!("[warn] {} object(s) failed to export", report.failures.len());
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Inspect {
            graph,
            material,
            config,
        } => {
            let cfg = load_config(&config)?;
            let graph = load_graph(&graph)?;
            let reader = NameReader::new(cfg.name_scan_limit);
            let object = graph
                .find_by_name(&material, &reader)
                .with_context(|| format!("No object named '{}' in asset graph", material))?;
            let Some(sidecar) =
                build_sidecar(&graph, object.id, &reader, &SuffixClassifier::default())
            else {
                bail!("'{}' is a {}, not a material", material, object.class_name());
            };
            let mat_lines = sidecar.mat_lines();
            let out = serde_json::json!({
                "sidecar": sidecar,
                "mat_lines": mat_lines,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        Commands::Classify { names } => {
            let classifier = SuffixClassifier::default();
            let out: Vec<ClassifyOutput> = names
                .into_iter()
                .map(|name| ClassifyOutput {
                    category: classifier.classify(&name).map(str::to_string),
                    name,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        Commands::Config { command } => match command {
            ConfigCommands::Init { config, force } => {
                if config.is_file() && !force {
                    bail!(
                        "Config already exists at {} (use --force to overwrite)",
                        config.display()
                    );
                }
                save_config(&config, &ExportConfig::default())?;
                println!("[ok] wrote {}", config.display());
                Ok(())
            }
            ConfigCommands::Show { config } => {
                let cfg = load_config(&config)?;
                println!("{}", serde_json::to_string_pretty(&cfg)?);
                Ok(())
            }
        },
    }
}
