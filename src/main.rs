use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use rust_decimal::Decimal;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli_style;

use cli_style::{
    get_styles, print_empty_list, print_error, print_key_value, print_list_item,
    print_section_footer, print_section_header, print_success, print_warning, CommandGroup,
    CommandHelp, TableBuilder,
};
use listing_catalog::admin::AdminResult;
use listing_catalog::catalog_store::{
    ListingCatalogStore, ListingFilter, ListingStatus, PriceRange, SqliteListingStore,
};
use listing_catalog::config::{AppConfig, CliConfig, FileConfig};
use listing_catalog::context::AppContext;

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles=get_styles(), version = env!("APP_VERSION"))]
struct CliArgs {
    /// Path to the catalog database file, created if missing.
    #[clap(value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// TOML config file. Its values take precedence over command line arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Number of read-only database connections.
    #[clap(long)]
    pub read_pool_size: Option<usize>,

    /// Default log level, overridden by the LOG_LEVEL environment variable.
    #[clap(long)]
    pub log_level: Option<String>,
}

#[derive(Parser)]
#[command(styles=get_styles(), name = "", disable_help_subcommand = true)]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Shows the registered admin models.
    Models,

    /// Shows every record of a model.
    List { model: String },

    /// Shows one record of a model.
    Show { model: String, id: i64 },

    /// Creates a record from a JSON object.
    Add { model: String, json: String },

    /// Changes a record, the JSON object only needs the fields to change.
    Change { model: String, id: i64, json: String },

    /// Deletes a record, along with whatever it owns.
    Delete { model: String, id: i64 },

    /// Queries listings, oldest first.
    Listings {
        #[clap(long)]
        category: Option<i64>,
        #[clap(long)]
        asset_type: Option<i64>,
        #[clap(long)]
        status: Option<ListingStatus>,
        #[clap(long)]
        min_price: Option<Decimal>,
        #[clap(long)]
        max_price: Option<Decimal>,
        #[clap(long)]
        city: Option<String>,
        /// Only listings with an id greater than this.
        #[clap(long)]
        after: Option<i64>,
        #[clap(long)]
        limit: Option<usize>,
    },

    /// Adds a feature to a listing.
    AttachFeature { listing_id: i64, feature_id: i64 },

    /// Removes a feature from a listing.
    DetachFeature { listing_id: i64, feature_id: i64 },

    /// Shows the features of a listing.
    FeaturesOf { listing_id: i64 },

    /// Shows the images of a listing in upload order, starring the main one.
    ImagesOf { listing_id: i64 },

    /// Shows the contact requests received by a listing.
    RequestsOf { listing_id: i64 },

    /// Marks a contact request as read.
    MarkRead { request_id: i64 },

    /// Shows the path of the current catalog db and its row counts.
    Where,

    /// Shows the available commands.
    Help,

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

const HELP_GROUPS: &[CommandGroup] = &[
    CommandGroup {
        title: "Models",
        commands: &[
            CommandHelp {
                name: "models",
                args: "",
                description: "Registered admin models",
            },
            CommandHelp {
                name: "list",
                args: "<model>",
                description: "All records of a model",
            },
            CommandHelp {
                name: "show",
                args: "<model> <id>",
                description: "One record",
            },
            CommandHelp {
                name: "add",
                args: "<model> <json>",
                description: "Create a record",
            },
            CommandHelp {
                name: "change",
                args: "<model> <id> <json>",
                description: "Update some fields of a record",
            },
            CommandHelp {
                name: "delete",
                args: "<model> <id>",
                description: "Delete a record",
            },
        ],
    },
    CommandGroup {
        title: "Listings",
        commands: &[
            CommandHelp {
                name: "listings",
                args: "[--category --asset-type --status --min-price --max-price --city --after --limit]",
                description: "Filtered listings",
            },
            CommandHelp {
                name: "attach-feature",
                args: "<listing> <feature>",
                description: "Add a feature to a listing",
            },
            CommandHelp {
                name: "detach-feature",
                args: "<listing> <feature>",
                description: "Remove a feature from a listing",
            },
            CommandHelp {
                name: "features-of",
                args: "<listing>",
                description: "Features of a listing",
            },
            CommandHelp {
                name: "images-of",
                args: "<listing>",
                description: "Images of a listing",
            },
            CommandHelp {
                name: "requests-of",
                args: "<listing>",
                description: "Contact requests of a listing",
            },
            CommandHelp {
                name: "mark-read",
                args: "<request>",
                description: "Mark a contact request as read",
            },
        ],
    },
    CommandGroup {
        title: "System",
        commands: &[
            CommandHelp {
                name: "where",
                args: "",
                description: "Database path and row counts",
            },
            CommandHelp {
                name: "help",
                args: "",
                description: "This help",
            },
            CommandHelp {
                name: "exit",
                args: "",
                description: "Quit",
            },
        ],
    },
];

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn print_record(title: &str, record: &Value) {
    print_section_header(title);
    if let Value::Object(fields) = record {
        for (key, value) in fields {
            print_key_value(key, &display_value(value));
        }
    }
    print_section_footer();
}

fn parse_json(payload: &str) -> Result<Value, String> {
    serde_json::from_str(payload).map_err(|e| format!("Invalid JSON: {}", e))
}

fn run_admin(result: AdminResult<()>) -> CommandExecutionResult {
    match result {
        Ok(()) => CommandExecutionResult::Ok,
        Err(err) => CommandExecutionResult::Error(err.to_string()),
    }
}

fn list_records(context: &AppContext, model: &str) -> AdminResult<()> {
    let admin = context.admin.get(model)?;
    let records = admin.list(context.store.as_ref())?;
    print_section_header(admin.verbose_name_plural());
    if records.is_empty() {
        print_empty_list("(none)");
    }
    for record in &records {
        print_list_item(&record.to_string());
    }
    print_section_footer();
    Ok(())
}

fn show_record(context: &AppContext, model: &str, id: i64) -> AdminResult<()> {
    let record = context.admin.get(model)?.get(context.store.as_ref(), id)?;
    print_record(&format!("{} #{}", model, id), &record);
    Ok(())
}

fn add_record(context: &AppContext, model: &str, payload: Value) -> AdminResult<()> {
    let record = context.admin.get(model)?.add(context.store.as_ref(), payload)?;
    print_success(&format!("Added {} #{}", model, display_value(&record["id"])));
    Ok(())
}

fn change_record(context: &AppContext, model: &str, id: i64, patch: Value) -> AdminResult<()> {
    let record = context
        .admin
        .get(model)?
        .change(context.store.as_ref(), id, patch)?;
    print_record(&format!("{} #{}", model, id), &record);
    Ok(())
}

fn delete_record(context: &AppContext, model: &str, id: i64) -> AdminResult<()> {
    context.admin.get(model)?.delete(context.store.as_ref(), id)?;
    print_success(&format!("Deleted {} #{}", model, id));
    Ok(())
}

fn execute_command(line: String, context: &AppContext, db_path: &str) -> CommandExecutionResult {
    if line.trim().is_empty() {
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(&line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    let cli = match cli {
        Ok(cli) => cli,
        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
            return CommandExecutionResult::Ok;
        }
    };

    let store = context.store.as_ref();
    match cli.command {
        InnerCommand::Models => {
            let mut table = TableBuilder::new(&["Model", "Name"]);
            for name in context.admin.names() {
                if let Ok(model) = context.admin.get(name) {
                    table.add_row(vec![name.to_string(), model.verbose_name_plural().to_string()]);
                }
            }
            table.print();
        }
        InnerCommand::List { model } => return run_admin(list_records(context, &model)),
        InnerCommand::Show { model, id } => return run_admin(show_record(context, &model, id)),
        InnerCommand::Add { model, json } => match parse_json(&json) {
            Ok(payload) => return run_admin(add_record(context, &model, payload)),
            Err(err) => return CommandExecutionResult::Error(err),
        },
        InnerCommand::Change { model, id, json } => match parse_json(&json) {
            Ok(patch) => return run_admin(change_record(context, &model, id, patch)),
            Err(err) => return CommandExecutionResult::Error(err),
        },
        InnerCommand::Delete { model, id } => {
            return run_admin(delete_record(context, &model, id))
        }
        InnerCommand::Listings {
            category,
            asset_type,
            status,
            min_price,
            max_price,
            city,
            after,
            limit,
        } => {
            let price_range = if min_price.is_some() || max_price.is_some() {
                Some(PriceRange {
                    min: min_price,
                    max: max_price,
                })
            } else {
                None
            };
            let filter = ListingFilter {
                category_id: category,
                asset_type_id: asset_type,
                status,
                price_range,
                location_city: city,
                after_id: after,
                limit,
            };
            match store.list_listings(&filter) {
                Ok(listings) if listings.is_empty() => print_warning("No listings match"),
                Ok(listings) => {
                    let mut table =
                        TableBuilder::new(&["ID", "Title", "Slug", "Status", "Price", "Area"]);
                    for listing in &listings {
                        table.add_row(vec![
                            listing.id.to_string(),
                            listing.title.clone(),
                            listing.slug.clone(),
                            listing.status.to_string(),
                            listing.price.to_string(),
                            format!("{} m²", listing.area),
                        ]);
                    }
                    table.print();
                }
                Err(err) => return CommandExecutionResult::Error(err.to_string()),
            }
        }
        InnerCommand::AttachFeature {
            listing_id,
            feature_id,
        } => {
            if let Err(err) = store.attach_feature(listing_id, feature_id) {
                return CommandExecutionResult::Error(err.to_string());
            }
            print_success(&format!(
                "Feature {} attached to listing {}",
                feature_id, listing_id
            ));
        }
        InnerCommand::DetachFeature {
            listing_id,
            feature_id,
        } => {
            if let Err(err) = store.detach_feature(listing_id, feature_id) {
                return CommandExecutionResult::Error(err.to_string());
            }
            print_success(&format!(
                "Feature {} detached from listing {}",
                feature_id, listing_id
            ));
        }
        InnerCommand::FeaturesOf { listing_id } => match store.listing_features(listing_id) {
            Ok(features) => {
                print_section_header(&format!("Features of listing {}", listing_id));
                if features.is_empty() {
                    print_empty_list("(no features)");
                }
                for feature in &features {
                    print_list_item(&format!("#{} {}", feature.id, feature));
                }
                print_section_footer();
            }
            Err(err) => return CommandExecutionResult::Error(err.to_string()),
        },
        InnerCommand::ImagesOf { listing_id } => {
            let result = store.main_image(listing_id).and_then(|main| {
                store
                    .listing_images(listing_id)
                    .map(|images| (main, images))
            });
            match result {
                Ok((main, images)) => {
                    print_section_header(&format!("Images of listing {}", listing_id));
                    match &main {
                        Some(image) => print_key_value("Main", &image.image),
                        None => print_empty_list("(no main image)"),
                    }
                    for image in &images {
                        let marker = if image.is_main { cli_style::STAR } else { " " };
                        print_list_item(&format!("{} #{} {}", marker, image.id, image.image));
                    }
                    print_section_footer();
                }
                Err(err) => return CommandExecutionResult::Error(err.to_string()),
            }
        }
        InnerCommand::RequestsOf { listing_id } => {
            let result = store.unread_contact_requests_count(listing_id).and_then(|unread| {
                store
                    .list_contact_requests(Some(listing_id))
                    .map(|requests| (unread, requests))
            });
            match result {
                Ok((unread, requests)) => {
                    print_section_header(&format!("Contact requests for listing {}", listing_id));
                    print_key_value("Unread", &unread.to_string());
                    if requests.is_empty() {
                        print_empty_list("(no requests)");
                    }
                    for request in &requests {
                        let state = if request.is_read { "read" } else { "new" };
                        print_list_item(&format!(
                            "#{} [{}] user {} at {}: {}",
                            request.id,
                            state,
                            request.user_id,
                            request.created_at.format("%Y-%m-%d %H:%M"),
                            request.message
                        ));
                    }
                    print_section_footer();
                }
                Err(err) => return CommandExecutionResult::Error(err.to_string()),
            }
        }
        InnerCommand::MarkRead { request_id } => {
            if let Err(err) = store.mark_read(request_id) {
                return CommandExecutionResult::Error(err.to_string());
            }
            print_success(&format!("Contact request {} marked as read", request_id));
        }
        InnerCommand::Where => {
            print_key_value("Database", db_path);
            match store.counts() {
                Ok(counts) => {
                    print_key_value("Categories", &counts.categories.to_string());
                    print_key_value("Asset types", &counts.asset_types.to_string());
                    print_key_value("Locations", &counts.locations.to_string());
                    print_key_value("Listings", &counts.listings.to_string());
                    print_key_value("Images", &counts.images.to_string());
                    print_key_value("Features", &counts.features.to_string());
                    print_key_value("Contact requests", &counts.contact_requests.to_string());
                    print_key_value("Users", &counts.users.to_string());
                }
                Err(err) => return CommandExecutionResult::Error(err.to_string()),
            }
        }
        InnerCommand::Help => cli_style::print_help(HELP_GROUPS),
        InnerCommand::Exit => return CommandExecutionResult::Exit,
    }
    CommandExecutionResult::Ok
}

#[derive(rustyline_derive::Hinter)]
struct MyHelper {
    commands_names: Vec<String>,
    model_names: Vec<String>,
}

impl MyHelper {
    pub fn new(model_names: Vec<String>) -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        MyHelper {
            commands_names,
            model_names,
        }
    }
}

impl Completer for MyHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let line = &line[..pos];
        let words: Vec<&str> = line.split(' ').collect();
        let (candidates, prefix) = match words.as_slice() {
            [command] => (&self.commands_names, *command),
            [_, model] => (&self.model_names, *model),
            _ => return Ok((pos, Vec::with_capacity(0))),
        };
        let matches = candidates
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect::<Vec<_>>();

        Ok((pos - prefix.len(), matches))
    }
}

impl Highlighter for MyHelper {}
impl Validator for MyHelper {}
impl Helper for MyHelper {}

fn init_tracing(default_level: LevelFilter) {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init();
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli_config = CliConfig {
        db_path: cli_args.db_path,
        read_pool_size: cli_args.read_pool_size,
        log_level: cli_args.log_level,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    init_tracing(config.log_level);

    let store = SqliteListingStore::new(&config.db_path, config.read_pool_size)?;
    let context = AppContext::new(Arc::new(store));
    let db_path = config.db_path.display().to_string();

    cli_style::print_welcome(&db_path, context.admin.len());

    let rl_config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<MyHelper, FileHistory>::with_config(rl_config)?;

    let model_names = context.admin.names().into_iter().map(String::from).collect();
    rl.set_helper(Some(MyHelper::new(model_names)));

    let prompt = cli_style::get_prompt();
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(line, &context, &db_path) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => {
                        break;
                    }
                    CommandExecutionResult::Error(err) => {
                        print_error(&err);
                        continue;
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                print_error(&format!("{:?}", e));
                break;
            }
        }
    }
    cli_style::print_goodbye();
    Ok(())
}
