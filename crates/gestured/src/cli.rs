//! CLI entry point: parse, run one operation, print JSON, exit.
//!
//! Exit codes are the status contract with callers and tests:
//! 0 success, 2 client error (bad request), 1 server error.

use crate::command::{parse_command, ClassifyArgs, Command, DataArgs, InputSource, MergeArgs, USAGE};
use crate::contract::{ClassifyRequest, ErrorResponse};
use crate::error::{ServiceError, StatusClass};
use crate::events::EventSink;
use crate::service::GestureService;
use std::io::Read;
use std::process::ExitCode;
use uuid::Uuid;

const EXIT_OK: u8 = 0;
const EXIT_SERVER_ERROR: u8 = 1;
const EXIT_CLIENT_ERROR: u8 = 2;

pub fn run() -> ExitCode {
    let command = match parse_command(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(reason) => {
            eprintln!("error: {}", reason);
            eprintln!("{}", USAGE);
            return ExitCode::from(EXIT_CLIENT_ERROR);
        }
    };

    let request_id = Uuid::new_v4().to_string();
    match execute(command, request_id) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::from(EXIT_OK)
        }
        Err(e) => {
            let body = ErrorResponse {
                error: e.to_string(),
            };
            println!(
                "{}",
                serde_json::to_string(&body).unwrap_or_else(|_| "{\"error\":\"\"}".to_string())
            );
            match e.status_class() {
                StatusClass::ClientError => ExitCode::from(EXIT_CLIENT_ERROR),
                StatusClass::ServerError => ExitCode::from(EXIT_SERVER_ERROR),
            }
        }
    }
}

fn execute(command: Command, request_id: String) -> Result<String, ServiceError> {
    match command {
        Command::Classify(args) => run_classify(args, request_id),
        Command::Merge(args) => run_merge(args, request_id),
        Command::Wipe(args) => run_wipe(args, request_id),
        Command::Labels(args) => run_labels(args, request_id),
    }
}

fn run_classify(args: ClassifyArgs, request_id: String) -> Result<String, ServiceError> {
    let events = EventSink::new(&args.data_root, request_id);
    let service = GestureService::open(&args.data_root, args.model.as_deref(), events)?;

    let body = read_body(&args.input)?;
    let request: ClassifyRequest = serde_json::from_str(&body)
        .map_err(|e| ServiceError::Validation(format!("malformed request body: {}", e)))?;

    let response = service.classify(&request)?;
    encode(&response)
}

fn run_merge(args: MergeArgs, request_id: String) -> Result<String, ServiceError> {
    let events = EventSink::new(&args.data_root, request_id);
    let service = GestureService::open(&args.data_root, None, events)?;

    let body = read_body(&args.input)?;
    let value: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| ServiceError::Validation(format!("malformed request body: {}", e)))?;

    let response = service.merge(&value)?;
    encode(&response)
}

fn run_wipe(args: DataArgs, request_id: String) -> Result<String, ServiceError> {
    let events = EventSink::new(&args.data_root, request_id);
    let service = GestureService::open(&args.data_root, None, events)?;
    let response = service.wipe()?;
    encode(&response)
}

fn run_labels(args: DataArgs, request_id: String) -> Result<String, ServiceError> {
    let events = EventSink::new(&args.data_root, request_id);
    let service = GestureService::open(&args.data_root, None, events)?;
    let labels = service.labels()?;
    encode(&labels)
}

fn read_body(input: &InputSource) -> Result<String, ServiceError> {
    match input {
        InputSource::Stdin => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .map_err(|e| ServiceError::Internal(format!("failed to read stdin: {}", e)))?;
            Ok(body)
        }
        InputSource::File(path) => std::fs::read_to_string(path).map_err(|e| {
            ServiceError::Validation(format!("failed to read {}: {}", path.display(), e))
        }),
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, ServiceError> {
    serde_json::to_string(value)
        .map_err(|e| ServiceError::Internal(format!("failed to encode response: {}", e)))
}
