//! Purpose: `caredex` CLI entry point and command dispatch.
//! Role: Binary crate root; parses args, runs registry calls, prints JSON on stdout.
//! Invariants: Results are pretty JSON on stdout; diagnostics go to stderr.
//! Invariants: Non-interactive errors are emitted as one-line JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal};

use clap::{Parser, Subcommand, error::ErrorKind as ClapErrorKind};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use caredex::api::{Error, ErrorKind, Operation, Patient, PatientClient, to_exit_code};

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(exit_code) => exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<i32, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Usage)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(exit_code);
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint(clap_error_hint(&err)));
            }
        },
    };

    let client = PatientClient::new(resolve_base_url(cli.url)?)?;
    let output = dispatch_command(cli.command, &client)?;
    emit_output(&output);
    Ok(0)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "caredex",
    version,
    about = "Typed client for HAL patient registries",
    long_about = None,
    after_help = r#"EXAMPLES
  $ caredex --url http://localhost:8080/patients list
  $ caredex get 3
  $ caredex save --record-json '{"id":0,"firstName":"Sarah","lastName":"Williams","email":"sw@example.com"}'
  $ caredex medications 3

NOTES
  - The registry url comes from --url or the CAREDEX_URL environment variable.
  - The url addresses the patient collection, e.g. http://host:8080/patients."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "URL",
        help = "Patient collection url (default: $CAREDEX_URL)"
    )]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "List all patients",
        long_about = r#"List every patient in the registry.

The registry returns the collection sorted by last name, ascending; the
listing is printed in that order."#,
        after_help = r#"EXAMPLES
  $ caredex list
  $ caredex list | jq '.[].email'"#
    )]
    List,
    #[command(
        arg_required_else_help = true,
        about = "Fetch one patient by id",
        after_help = r#"EXAMPLES
  $ caredex get 3"#
    )]
    Get {
        #[arg(help = "Patient id")]
        id: i64,
    },
    #[command(
        arg_required_else_help = true,
        about = "Create or update a patient",
        long_about = r#"Create or update a patient from a full record.

A record with id 0 has never been persisted and is created (the registry
assigns the real id); any other id replaces that existing record."#,
        after_help = r#"EXAMPLES
  $ caredex save --record-json '{"id":0,"firstName":"Sarah","lastName":"Williams","email":"sw@example.com"}'
  $ caredex save --record-json '{"id":42,"firstName":"Sarah","lastName":"Williams-Day","email":"sw@example.com"}'"#
    )]
    Save {
        #[arg(
            long = "record-json",
            value_name = "JSON",
            help = "Full patient record as JSON (id 0 creates)"
        )]
        record_json: String,
    },
    #[command(
        arg_required_else_help = true,
        about = "Delete a patient by id",
        after_help = r#"EXAMPLES
  $ caredex delete 3"#
    )]
    Delete {
        #[arg(help = "Patient id")]
        id: i64,
    },
    #[command(
        arg_required_else_help = true,
        about = "List a patient's medications",
        after_help = r#"EXAMPLES
  $ caredex medications 3"#
    )]
    Medications {
        #[arg(help = "Patient id")]
        patient_id: i64,
    },
    #[command(
        arg_required_else_help = true,
        about = "List a patient's pharmacies",
        after_help = r#"EXAMPLES
  $ caredex pharmacies 3"#
    )]
    Pharmacies {
        #[arg(help = "Patient id")]
        patient_id: i64,
    },
    #[command(
        arg_required_else_help = true,
        about = "List a patient's physicians",
        after_help = r#"EXAMPLES
  $ caredex physicians 3"#
    )]
    Physicians {
        #[arg(help = "Patient id")]
        patient_id: i64,
    },
}

fn dispatch_command(command: Command, client: &PatientClient) -> Result<Value, Error> {
    match command {
        Command::List => output_json(&client.list_patients()?),
        Command::Get { id } => output_json(&client.patient(id)?),
        Command::Save { record_json } => {
            let patient = parse_patient_record(&record_json)?;
            let operation = Operation::for_id(patient.id);
            client.save_patient(&patient)?;
            Ok(save_ack(operation))
        }
        Command::Delete { id } => {
            client.delete_patient(id)?;
            Ok(json!({"deleted": {"id": id}}))
        }
        Command::Medications { patient_id } => output_json(&client.medications(patient_id)?),
        Command::Pharmacies { patient_id } => output_json(&client.pharmacies(patient_id)?),
        Command::Physicians { patient_id } => output_json(&client.physicians(patient_id)?),
    }
}

fn save_ack(operation: Operation) -> Value {
    match operation {
        Operation::Create => json!({"saved": {"operation": "created"}}),
        Operation::Update { id } => json!({"saved": {"operation": "updated", "id": id}}),
    }
}

fn resolve_base_url(flag: Option<String>) -> Result<String, Error> {
    base_url_from(flag, std::env::var("CAREDEX_URL").ok())
}

fn base_url_from(flag: Option<String>, env_value: Option<String>) -> Result<String, Error> {
    if let Some(url) = flag {
        return Ok(url);
    }
    match env_value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message("no registry url configured")
            .with_hint("Pass --url http://host:port/patients or set CAREDEX_URL.")),
    }
}

fn parse_patient_record(raw: &str) -> Result<Patient, Error> {
    serde_json::from_str(raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid patient json")
            .with_hint(
                "Provide a full record, e.g. '{\"id\":0,\"firstName\":\"A\",\"lastName\":\"B\",\"email\":\"a@b.example\"}'.",
            )
            .with_source(err)
    })
}

fn output_json<T: Serialize>(value: &T) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("failed to encode output json")
            .with_source(err)
    })
}

fn emit_output(value: &Value) {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    println!("{rendered}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Decode\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Transport => "transport error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::MalformedEnvelope => "malformed envelope".to_string(),
        ErrorKind::RelationNotFound => "relation not found".to_string(),
        ErrorKind::Decode => "decode error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(url) = err.url() {
        inner.insert("url".to_string(), json!(url));
    }
    if let Some(relation) = err.relation() {
        inner.insert("relation".to_string(), json!(relation));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    if let Some(index) = err.index() {
        inner.insert("index".to_string(), json!(index));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = Vec::new();
    lines.push(format!("error: {}", error_message(err)));

    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(url) = err.url() {
        lines.push(format!("url: {url}"));
    }
    if let Some(relation) = err.relation() {
        lines.push(format!("relation: {relation}"));
    }
    if let Some(status) = err.status() {
        lines.push(format!("status: {status}"));
    }
    if let Some(index) = err.index() {
        lines.push(format!("index: {index}"));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!("caused by: {cause}"));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `caredex --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "caredex") else {
        return "Try `caredex --help`.".to_string();
    };

    let mut parts = Vec::new();
    for token in tokens.iter().skip(pos + 1) {
        if token.starts_with('-') || token.starts_with('<') || token.starts_with('[') {
            break;
        }
        parts.push(*token);
    }

    if parts.is_empty() {
        return "Try `caredex --help`.".to_string();
    }

    format!("Try `caredex {} --help`.", parts.join(" "))
}
