use std::{path::Path, sync::Arc, time::Duration};

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use route_editor::{
    adapters::{FileDirectory, HttpDirectory, StaticDirectory},
    config::{
        DirectoryConfig, DirectorySource, EditorConfig, EditorConfigValidator, UidStrategy,
        loader::{load_config, load_json, load_route},
    },
    core::{
        RandomUidGenerator, RouteEditor, RouteForm, RouteFormState, SequentialUidGenerator,
        UidGenerator, ValidationError,
    },
    ports::{DirectoryWatch, DomainDirectory, ServiceDirectory},
    tracing_setup,
};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::Instrument;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Commands,

    /// Editor settings file (YAML, JSON or TOML)
    #[clap(short, long, global = true)]
    config: Option<String>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Print the form state hydrated from a route file
    Hydrate {
        /// Persisted route record (JSON)
        #[clap(short, long)]
        route: String,
    },
    /// Validate a route, or an edited form state, and print the route payload
    Validate {
        /// Persisted route record (JSON); the edit target
        #[clap(short, long)]
        route: Option<String>,
        /// Edited form state (JSON); validated instead of the hydrated route
        #[clap(short, long)]
        form: Option<String>,
    },
    /// Write a template route file
    Init {
        /// Output path for the new route file
        #[clap(short, long, default_value = "route.json")]
        output: String,
    },
    /// Re-validate a route whenever a directory changes
    Watch {
        /// Persisted route record (JSON)
        #[clap(short, long)]
        route: String,
    },
}

struct Directories {
    services: Arc<dyn ServiceDirectory>,
    domains: Arc<dyn DomainDirectory>,
    changes: Vec<mpsc::Receiver<()>>,
}

fn duration(value: &str, field: &str) -> Result<Duration> {
    humantime::parse_duration(value).with_context(|| format!("Invalid {field} '{value}'"))
}

fn file_directory(
    services: Option<std::path::PathBuf>,
    domains: Option<std::path::PathBuf>,
    watch: bool,
    changes: &mut Vec<mpsc::Receiver<()>>,
) -> Result<FileDirectory> {
    let directory = if watch {
        FileDirectory::watched(services, domains)?
    } else {
        FileDirectory::new(services, domains)
    };
    changes.extend(directory.watch());
    Ok(directory)
}

fn http_directory(
    services: Option<String>,
    domains: Option<String>,
    settings: &DirectoryConfig,
    watch: bool,
    changes: &mut Vec<mpsc::Receiver<()>>,
) -> Result<HttpDirectory> {
    let mut directory = HttpDirectory::new(
        services,
        domains,
        duration(&settings.timeout, "directories.timeout")?,
    );
    if watch {
        directory =
            directory.with_polling(duration(&settings.poll_interval, "directories.poll_interval")?);
    }
    changes.extend(directory.watch());
    Ok(directory)
}

fn create_directories(settings: &DirectoryConfig, watch: bool) -> Result<Directories> {
    let mut changes = Vec::new();

    let services: Arc<dyn ServiceDirectory> =
        match settings.services.as_deref().map(DirectorySource::parse).transpose()? {
            Some(DirectorySource::File(path)) => {
                Arc::new(file_directory(Some(path), None, watch, &mut changes)?)
            }
            Some(DirectorySource::Http(url)) => Arc::new(http_directory(
                Some(url.to_string()),
                None,
                settings,
                watch,
                &mut changes,
            )?),
            None => {
                tracing::warn!("No service directory configured; service options will be empty");
                Arc::new(StaticDirectory::default())
            }
        };

    let domains: Arc<dyn DomainDirectory> =
        match settings.domains.as_deref().map(DirectorySource::parse).transpose()? {
            Some(DirectorySource::File(path)) => {
                Arc::new(file_directory(None, Some(path), watch, &mut changes)?)
            }
            Some(DirectorySource::Http(url)) => Arc::new(http_directory(
                None,
                Some(url.to_string()),
                settings,
                watch,
                &mut changes,
            )?),
            None => {
                tracing::warn!("No domain directory configured; domain options will be empty");
                Arc::new(StaticDirectory::default())
            }
        };

    Ok(Directories {
        services,
        domains,
        changes,
    })
}

fn uid_generator(strategy: UidStrategy) -> Arc<dyn UidGenerator> {
    match strategy {
        UidStrategy::Sequential => Arc::new(SequentialUidGenerator::new()),
        UidStrategy::Random => Arc::new(RandomUidGenerator),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)
            .await
            .with_context(|| format!("Failed to load editor settings from {path}"))?,
        None => EditorConfig::default(),
    };
    EditorConfigValidator::validate(&config).map_err(|e| eyre!("{e}"))?;

    tracing_setup::init_tracing_with_config(&config.log_level, config.json_logs)
        .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;

    match args.command {
        Commands::Hydrate { route } => hydrate_command(&config, &route).await,
        Commands::Validate { route, form } => {
            validate_command(&config, route.as_deref(), form.as_deref()).await
        }
        Commands::Init { output } => init_route_command(&output).await,
        Commands::Watch { route } => watch_command(&config, &route).await,
    }
}

async fn open_editor(
    config: &EditorConfig,
    route_path: Option<&str>,
    watch: bool,
) -> Result<(RouteEditor, Vec<mpsc::Receiver<()>>)> {
    let target = match route_path {
        Some(path) => Some(load_route(path).await?),
        None => None,
    };

    let directories = create_directories(&config.directories, watch)?;
    let mut editor = RouteEditor::new(
        directories.services,
        directories.domains,
        uid_generator(config.uid_strategy),
    );

    let span = tracing_setup::create_session_span(target.as_ref().map(|r| r.name.as_str()));
    editor.open(target).instrument(span).await;
    Ok((editor, directories.changes))
}

/// Print the hydrated form state and option lists as JSON
async fn hydrate_command(config: &EditorConfig, route_path: &str) -> Result<()> {
    let (editor, _) = open_editor(config, Some(route_path), false).await?;
    let form = editor.form();

    let output = json!({
        "phase": form.phase().to_string(),
        "state": form.state(),
        "serviceOptions": form.service_options(),
        "domainOptions": form.domain_options(),
        "methodOptions": form.method_options(),
        "matchTypeOptions": form.match_type_options(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn validate_command(
    config: &EditorConfig,
    route_path: Option<&str>,
    form_path: Option<&str>,
) -> Result<()> {
    if route_path.is_none() && form_path.is_none() {
        eprintln!("❌ Error: pass --route, --form, or both");
        std::process::exit(2);
    }

    let (mut editor, _) = open_editor(config, route_path, false).await?;

    if let Some(path) = form_path {
        let edited: RouteFormState = load_json(path).await?;
        editor
            .form_mut()
            .edit(|state| *state = edited)
            .with_context(|| format!("Form state in {path} cannot be applied"))?;
    }

    match editor.submit() {
        Ok(route) => {
            println!("{}", serde_json::to_string_pretty(&route)?);
            Ok(())
        }
        Err(e) => {
            report_invalid(&e)?;
            std::process::exit(1);
        }
    }
}

fn report_invalid(error: &ValidationError) -> Result<()> {
    let errors: Vec<_> = error
        .errors()
        .iter()
        .map(|e| json!({ "field": e.field().as_str(), "message": e.message() }))
        .collect();
    eprintln!("❌ Route validation failed:");
    eprintln!("{error}");
    println!("{}", serde_json::to_string_pretty(&json!({ "errors": errors }))?);
    Ok(())
}

fn print_outcome(form: &mut RouteForm) -> Result<()> {
    match form.validate_and_extract() {
        Ok(values) => {
            println!("✅ Route '{}' is valid", values.name);
        }
        Err(e) => report_invalid(&e)?,
    }
    Ok(())
}

/// Validate once, then again after every directory change
async fn watch_command(config: &EditorConfig, route_path: &str) -> Result<()> {
    let (mut editor, mut changes) = open_editor(config, Some(route_path), true).await?;
    print_outcome(editor.form_mut())?;

    if changes.is_empty() {
        eprintln!("❌ Error: no watchable directory configured");
        std::process::exit(1);
    }

    // Fan every directory's change signal into one channel
    let (tx, rx) = mpsc::channel(1);
    for mut source in changes.drain(..) {
        let tx = tx.clone();
        tokio::spawn(async move {
            while source.recv().await.is_some() {
                let _ = tx.try_send(());
            }
        });
    }
    drop(tx);

    editor
        .follow(rx, |form| {
            if let Err(e) = print_outcome(form) {
                tracing::error!("Failed to report validation outcome: {}", e);
            }
        })
        .await;
    Ok(())
}

/// Write a template route file
async fn init_route_command(output: &str) -> Result<()> {
    let path = Path::new(output);
    if path.exists() {
        eprintln!("❌ Error: Route file '{output}' already exists");
        std::process::exit(1);
    }

    let template = r#"{
  "name": "user-default",
  "domainList": ["example.com"],
  "routePredicates": {
    "pathPredicates": { "type": "PRE", "path": "/user", "ignoreCase": true },
    "methodPredicates": ["GET", "POST"],
    "headerPredicates": [{ "key": "x-env", "value": "gray", "matchType": "EQUAL" }],
    "queryPredicates": []
  },
  "services": [{ "name": "user-service" }]
}
"#;

    tokio::fs::write(path, template)
        .await
        .context("Failed to write route file")?;
    println!("✅ Created template route at: {output}");
    println!("   Run 'route-editor validate --route {output}' to check it");
    Ok(())
}
