use anyhow::Context;
use clap::Parser;
use formwire::adapters::api_service::ApiService;
use formwire::adapters::fixture_transport::FixtureTransport;
use formwire::adapters::html_renderer::HtmlRenderer;
use formwire::adapters::http_transport::ReqwestTransport;
use formwire::cli::{Cli, Command};
use formwire::config::{read_document, ApiCatalog, FormConfig, Settings};
use formwire::domain::{FormState, HttpTransport, SubmitOutcome};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = Settings::new_with_cli(&cli)?;

    match cli.command {
        Command::Render { schema, output } => {
            let renderer = HtmlRenderer::new()?;
            let html = renderer.render_document(&read_document(&schema)?)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, html).with_context(|| format!("writing {}", path.display()))?;
                    info!("Rendered {} to {}", schema.display(), path.display());
                }
                None => println!("{}", html),
            }
        }
        Command::Check { schema, data } => {
            let config = FormConfig::from_path(&schema)?;
            let mut state = FormState::new(&config)?;
            let data: Value = serde_json::from_str(&data).context("--data must be a JSON object")?;
            if let Some(values) = data.as_object() {
                for (name, value) in values {
                    state.set_value(name, value.clone())?;
                }
            }

            let report = match state.submit(|_| {}) {
                SubmitOutcome::Submitted(values) => json!({ "valid": true, "values": values }),
                SubmitOutcome::Rejected(errors) => json!({ "valid": false, "errors": errors }),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Endpoints { catalog } => {
            let catalog = ApiCatalog::from_path(&catalog)?;
            println!("{}", catalog.service_title.as_deref().unwrap_or(&catalog.service_name));
            for endpoint in &catalog.endpoints {
                let mut flags = Vec::new();
                if endpoint.auth {
                    flags.push("auth".to_string());
                }
                if endpoint.cache {
                    flags.push("cache".to_string());
                }
                if endpoint.mock {
                    flags.push("mock".to_string());
                }
                if endpoint.retry > 0 {
                    flags.push(format!("retry={}", endpoint.retry));
                }
                println!(
                    "  {:<24} {:<6} {} {}",
                    endpoint.name,
                    endpoint.method.as_str(),
                    endpoint.url,
                    flags.join(" ")
                );
            }
        }
        Command::Call {
            catalog,
            endpoint,
            payload,
            fixtures,
        } => {
            let transport: Arc<dyn HttpTransport> = match fixtures {
                Some(path) => {
                    info!("Serving requests from fixtures {}", path.display());
                    Arc::new(FixtureTransport::from_path(&path)?)
                }
                None => Arc::new(ReqwestTransport::new(&settings.http.user_agent)?),
            };

            let mut service = ApiService::new(ApiCatalog::from_path(&catalog)?, transport);
            if let Some(base_url) = &settings.http.base_url {
                service = service.with_base_url(base_url.clone());
            }
            service.set_token(settings.http.token.clone()).await;

            let payload: Value = serde_json::from_str(&payload).context("--payload must be JSON")?;
            info!("Calling {} on {}", endpoint, service.service_name());
            let result = service.call(&endpoint, payload, None).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
