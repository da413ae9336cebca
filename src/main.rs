use clap::{Arg, Command};
use jobsift::patterns::PatternsFile;
use jobsift::pipeline::Pipeline;
use jobsift::{RawMessage, Settings};
use log::LevelFilter;
use std::collections::HashMap;
use std::process;

fn main() {
    let matches = Command::new("jobsift")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Job-search mailbox triage: classify messages and resolve companies")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Settings file path")
                .default_value("jobsift.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Write a default settings file and pattern set, then exit")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the settings and pattern files")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("test-email")
                .long("test-email")
                .value_name("FILE")
                .help("Classify a raw message file and print the record as JSON")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging with per-stage decisions")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(path) = matches.get_one::<String>("generate-config") {
        generate_default_config(path);
        return;
    }

    let config_path = matches.get_one::<String>("config").unwrap();
    let settings = match Settings::from_file(config_path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings from {config_path}: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        test_config(&settings);
        return;
    }

    if let Some(email_file) = matches.get_one::<String>("test-email") {
        test_email_file(&settings, email_file);
        return;
    }

    eprintln!("Nothing to do; see --help");
}

fn generate_default_config(path: &str) {
    let settings = Settings::default();
    if let Err(e) = settings.to_file(path) {
        eprintln!("Failed to write settings to {path}: {e}");
        process::exit(1);
    }
    println!("Wrote default settings to {path}");

    if !std::path::Path::new(&settings.patterns_path).exists() {
        if let Some(parent) = std::path::Path::new(&settings.patterns_path).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match PatternsFile::default().to_file(&settings.patterns_path) {
            Ok(()) => println!("Wrote default pattern set to {}", settings.patterns_path),
            Err(e) => {
                eprintln!(
                    "Failed to write pattern set to {}: {e}",
                    settings.patterns_path
                );
                process::exit(1);
            }
        }
    }
}

fn test_config(settings: &Settings) {
    println!("Testing configuration...");
    match PatternsFile::from_file(&settings.patterns_path) {
        Ok(file) => {
            let compiled = file.compile();
            println!("Pattern set: {}", settings.patterns_path);
            println!("  label rules: {}", compiled.label_rules.len());
            for rule in &compiled.label_rules {
                println!(
                    "    {} ({} patterns, {} exclusions)",
                    rule.label,
                    rule.patterns.len(),
                    rule.exclusions.len()
                );
            }
            println!("  domain mappings: {}", compiled.domain_map.len());
            println!("  known companies: {}", compiled.known_companies.len());
            println!("  ATS domains: {}", compiled.ats_domains.len());
            println!("  personal domains: {}", compiled.personal_domains.len());
            println!("Configuration is valid.");
        }
        Err(e) => {
            eprintln!("Pattern set failed to load: {e}");
            process::exit(1);
        }
    }
}

fn test_email_file(settings: &Settings, path: &str) {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Failed to read {path}: {e}");
            process::exit(1);
        }
    };

    let pipeline = match Pipeline::new(settings.clone()) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("Failed to build pipeline: {e}");
            process::exit(1);
        }
    };

    let message = parse_message_file(&content);
    let record = pipeline.process(&message);
    match serde_json::to_string_pretty(&record) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to serialize record: {e}");
            process::exit(1);
        }
    }
}

/// Parse a plain message dump: header lines until the first blank line
/// (continuation lines folded), then the body.
fn parse_message_file(content: &str) -> RawMessage {
    let mut headers: HashMap<String, String> = HashMap::new();
    let mut body = String::new();
    let mut in_body = false;
    let mut last_key: Option<String> = None;

    for line in content.lines() {
        if in_body {
            body.push_str(line);
            body.push('\n');
            continue;
        }
        if line.trim().is_empty() {
            in_body = true;
            continue;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            // folded continuation of the previous header
            if let Some(key) = &last_key {
                if let Some(value) = headers.get_mut(key) {
                    value.push(' ');
                    value.push_str(line.trim());
                }
            }
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_lowercase();
            headers.insert(key.clone(), value.trim().to_string());
            last_key = Some(key);
        }
    }

    let sender = headers.get("from").cloned().unwrap_or_default();
    let subject = headers.get("subject").cloned().unwrap_or_default();
    let thread_id = headers.get("message-id").cloned().unwrap_or_default();

    RawMessage {
        sender,
        subject,
        body,
        headers,
        received_at: None,
        thread_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_file() {
        let raw = "From: Acme Careers <jobs@acme.com>\n\
                   Subject: Thank you for applying\n\
                   X-Long: first part\n\
                   \tsecond part\n\
                   \n\
                   Body line one.\n\
                   Body line two.\n";
        let msg = parse_message_file(raw);
        assert_eq!(msg.sender, "Acme Careers <jobs@acme.com>");
        assert_eq!(msg.subject, "Thank you for applying");
        assert_eq!(msg.header("x-long"), Some("first part second part"));
        assert!(msg.body.starts_with("Body line one."));
    }
}
