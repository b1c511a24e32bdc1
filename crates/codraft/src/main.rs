//! codraft CLI
#![deny(unsafe_code)]

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Parser;
use codraft::{Cli, Commands, commands};
use codraft_core::config::ConfigLoader;
use tracing::debug;

mod observability;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.color.apply();

    if cli.version_only {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // arg_required_else_help guarantees a subcommand when --version-only is absent
    let Some(command) = cli.command else {
        return Ok(());
    };

    if let Some(dir) = &cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| {
        anyhow::anyhow!(
            "current directory is not valid UTF-8: {}",
            e.into_path_buf().display()
        )
    })?;
    let mut loader = ConfigLoader::new().with_project_search(&cwd);
    if let Some(path) = &cli.config {
        let path = Utf8PathBuf::try_from(path.clone()).map_err(|e| {
            anyhow::anyhow!(
                "config path is not valid UTF-8: {}",
                e.into_path_buf().display()
            )
        })?;
        loader = loader.with_file(&path);
    }
    let (config, config_sources) = loader.load().context("failed to load configuration")?;

    let obs_config = observability::ObservabilityConfig::from_env_with_overrides(
        config
            .log_dir
            .as_ref()
            .map(|dir| dir.as_std_path().to_path_buf()),
    );
    let env_filter = observability::env_filter(cli.quiet, cli.verbose, config.log_level.as_str());
    let _guard = observability::init_observability(&obs_config, env_filter)
        .context("failed to initialize logging/tracing")?;

    let actor = commands::resolve_actor(cli.actor.as_deref(), &config);
    let max_input = config.input_limit();
    debug!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        json = cli.json,
        color = ?cli.color,
        chdir = ?cli.chdir,
        actor = ?actor,
        "CLI initialized"
    );

    let json = cli.json;
    let actor = actor.as_ref();
    let result = match command {
        Commands::New(args) => commands::open_drafts(&config).and_then(|drafts| {
            commands::new::cmd_new(args, json, &drafts, actor, config.default_limit, max_input)
        }),
        Commands::Show(args) => commands::open_drafts(&config)
            .and_then(|drafts| commands::show::cmd_show(args, json, &drafts)),
        Commands::Contribute(args) => commands::open_drafts(&config).and_then(|drafts| {
            commands::contribute::cmd_contribute(args, json, &drafts, actor, max_input)
        }),
        Commands::Complete(args) => commands::open_drafts(&config)
            .and_then(|drafts| commands::complete::cmd_complete(args, json, &drafts, actor)),
        Commands::History(args) => commands::open_drafts(&config)
            .and_then(|drafts| commands::history::cmd_history(args, json, &drafts)),
        Commands::List(args) => commands::open_drafts(&config)
            .and_then(|drafts| commands::list::cmd_list(args, json, &drafts)),
        Commands::Mine(args) => commands::open_drafts(&config)
            .and_then(|drafts| commands::list::cmd_mine(args, json, &drafts, actor)),
        Commands::Verify(args) => commands::open_drafts(&config)
            .and_then(|drafts| commands::verify::cmd_verify(args, json, &drafts)),
        Commands::Metrics(args) => commands::metrics::cmd_metrics(args, json, max_input),
        Commands::Info(args) => commands::info::cmd_info(args, json, &config, &config_sources),
        #[cfg(feature = "mcp")]
        Commands::Serve(args) => commands::open_drafts(&config).and_then(|drafts| {
            let rt = tokio::runtime::Runtime::new()
                .context("failed to create async runtime for MCP server")?;
            rt.block_on(commands::serve::cmd_serve(args, drafts, max_input))
        }),
    };
    if let Err(err) = &result {
        tracing::error!(error = %err, "fatal error");
    }
    result
}
