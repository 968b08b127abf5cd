use clap::Parser;

mod args;
mod error;
mod prelude;

use adapter::catalog::CatalogFetcher;
use adapter::context::ChatEntry;
use adapter::path::resolve;
use adapter::samplers::SamplerPreset;
use adapter::template::{builtin_templates, validate_catalog, BackendTemplate, ConnectionValues};
use adapter::{RequestBody, RequestBuilder};

use crate::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let template = load_template(&args.globals)?;
    let connection: ConnectionValues = read_json(&args.globals.connection)?;

    match args.command {
        Command::Build { preset, chat, stop } => {
            let preset: SamplerPreset = read_json(&preset)?;
            let chat: Vec<ChatEntry> = read_json(&chat)?;

            let builder = RequestBuilder::new(&template, &preset, &connection, &stop);
            let body = builder.build(&chat)?;

            for (name, value) in builder.headers() {
                println!("{name}: {value}");
            }
            match body {
                RequestBody::Json(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                RequestBody::Raw(text) => println!("{text}"),
            }
            Ok(())
        }
        Command::Models => {
            let fetcher = CatalogFetcher::new()?;
            // Catalog failures are recoverable; report and keep going.
            match fetcher.fetch(&template, &connection).await {
                Ok(models) => {
                    for model in &models {
                        match resolve(model, &template.model_name_path) {
                            Some(serde_json::Value::String(name)) => println!("{name}"),
                            Some(other) => println!("{other}"),
                            None => log::warn!("model entry without a name: {model}"),
                        }
                    }
                    Ok(())
                }
                Err(e) => {
                    log::error!("could not retrieve models: {e}");
                    Ok(())
                }
            }
        }
    }
}

/// Loads the template from a file, or picks a bundled one by name. Either
/// way the catalog invariants are checked before any request is built.
fn load_template(globals: &Globals) -> Result<BackendTemplate> {
    if let Some(path) = &globals.template {
        let template: BackendTemplate = read_json(path)?;
        template.validate()?;
        return Ok(template);
    }

    let templates = builtin_templates();
    validate_catalog(&templates)?;
    templates
        .into_iter()
        .find(|template| template.name == globals.backend)
        .ok_or_else(|| Error::UnknownTemplate(globals.backend.clone()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
