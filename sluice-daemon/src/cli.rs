//! CLI argument definitions for sluice-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.
//! Every override flag is optional; when present it takes precedence over
//! both the configuration file and `SLUICE_*` environment variables.

use std::path::PathBuf;

use clap::Parser;

use sluice_core::config::SluiceConfig;
use sluice_core::types::{OutputKind, ParserKind, Protocol, ShutdownPolicy, TcpFraming};

/// sluice syslog collector.
///
/// Receives syslog over TCP/UDP, parses each message body (grok, json,
/// kv, cef or raw), writes one JSON object per line into a batch file and
/// hands every finished batch to the configured output sink.
#[derive(Parser, Debug, Default)]
#[command(name = "sluice")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to sluice.toml configuration file.
    ///
    /// Without it the built-in defaults are used.
    #[arg(short, long, env = "SLUICE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Validate the effective configuration and exit without starting.
    #[arg(long)]
    pub validate: bool,

    /// Rotation interval in seconds.
    #[arg(long, value_name = "SECS")]
    pub schedule: Option<u64>,

    /// Listen IP address.
    #[arg(long)]
    pub ip: Option<String>,

    /// Listen port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Listener protocol (tcp, udp, both).
    #[arg(long)]
    pub protocol: Option<Protocol>,

    /// TCP framing (newline, octet_counting).
    #[arg(long)]
    pub framing: Option<TcpFraming>,

    /// Body parser (grok, json, kv, cef, raw).
    #[arg(long)]
    pub parser: Option<ParserKind>,

    /// Grok pattern, tried in the order given. Repeat for more patterns.
    ///
    /// Replaces the patterns from the configuration file.
    #[arg(long = "grok-pattern", value_name = "PATTERN")]
    pub grok_patterns: Vec<String>,

    /// Extra grok definition as NAME=REGEX. Repeatable.
    #[arg(long = "grok-define", value_name = "NAME=REGEX", value_parser = parse_definition)]
    pub grok_definitions: Vec<(String, String)>,

    /// Merge syslog metadata into every parsed event.
    #[arg(long)]
    pub keep_syslog: bool,

    /// Keep the original body field when merging metadata.
    #[arg(long)]
    pub keep_message: bool,

    /// Directory for in-progress batch files.
    #[arg(long)]
    pub tmp_dir: Option<String>,

    /// What to do with the partial batch on shutdown (discard, flush).
    #[arg(long)]
    pub shutdown_policy: Option<ShutdownPolicy>,

    /// Output sink (file, stdout).
    #[arg(long)]
    pub output: Option<OutputKind>,

    /// Destination directory for the file sink.
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Force debug logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Override PID file path.
    #[arg(long)]
    pub pid_file: Option<String>,
}

impl DaemonCli {
    /// Apply command-line overrides on top of an already loaded configuration.
    pub fn apply_overrides(&self, config: &mut SluiceConfig) {
        if let Some(secs) = self.schedule {
            config.batch.schedule_secs = secs;
        }
        if let Some(ip) = &self.ip {
            config.listener.ip.clone_from(ip);
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(protocol) = self.protocol {
            config.listener.protocol = protocol;
        }
        if let Some(framing) = self.framing {
            config.listener.framing = framing;
        }
        if let Some(parser) = self.parser {
            config.parser.kind = parser;
        }
        if !self.grok_patterns.is_empty() {
            config.parser.grok_patterns.clone_from(&self.grok_patterns);
        }
        for (name, definition) in &self.grok_definitions {
            config
                .parser
                .custom_patterns
                .insert(name.clone(), definition.clone());
        }
        if self.keep_syslog {
            config.parser.keep_syslog = true;
        }
        if self.keep_message {
            config.parser.keep_message = true;
        }
        if let Some(dir) = &self.tmp_dir {
            config.batch.tmp_dir.clone_from(dir);
        }
        if let Some(policy) = self.shutdown_policy {
            config.batch.shutdown_policy = policy;
        }
        if let Some(kind) = self.output {
            config.output.kind = kind;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir.clone_from(dir);
        }
        if self.verbose {
            config.general.verbose = true;
        }
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
        if let Some(pid_file) = &self.pid_file {
            config.general.pid_file.clone_from(pid_file);
        }
    }
}

fn parse_definition(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, definition)) if !name.is_empty() && !definition.is_empty() => {
            Ok((name.to_owned(), definition.to_owned()))
        }
        _ => Err(format!("expected NAME=REGEX, got '{arg}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> DaemonCli {
        DaemonCli::try_parse_from(std::iter::once("sluice").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn no_arguments_changes_nothing() {
        let cli = parse(&[]);
        let mut config = SluiceConfig::default();
        cli.apply_overrides(&mut config);

        let defaults = SluiceConfig::default();
        assert_eq!(config.listener.port, defaults.listener.port);
        assert_eq!(config.parser.kind, defaults.parser.kind);
        assert_eq!(config.batch.schedule_secs, defaults.batch.schedule_secs);
        assert!(!config.general.verbose);
    }

    #[test]
    fn listener_and_parser_overrides() {
        let cli = parse(&[
            "--ip",
            "127.0.0.1",
            "--port",
            "5514",
            "--protocol",
            "both",
            "--framing",
            "octet_counting",
            "--parser",
            "grok",
            "--grok-pattern",
            "%{IP:client} %{WORD:action}",
            "--grok-pattern",
            "%{GREEDYDATA:message}",
            "--grok-define",
            "TICKET=[A-Z]+-[0-9]+",
            "--schedule",
            "5",
            "--keep-syslog",
        ]);
        let mut config = SluiceConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.listener.ip, "127.0.0.1");
        assert_eq!(config.listener.port, 5514);
        assert_eq!(config.listener.protocol, Protocol::Both);
        assert_eq!(config.listener.framing, TcpFraming::OctetCounting);
        assert_eq!(config.parser.kind, ParserKind::Grok);
        assert_eq!(
            config.parser.grok_patterns,
            vec!["%{IP:client} %{WORD:action}", "%{GREEDYDATA:message}"]
        );
        assert_eq!(
            config.parser.custom_patterns.get("TICKET").map(String::as_str),
            Some("[A-Z]+-[0-9]+")
        );
        assert_eq!(config.batch.schedule_secs, 5);
        assert!(config.parser.keep_syslog);
        assert!(!config.parser.keep_message);
        config.validate().expect("overridden config should be valid");
    }

    #[test]
    fn unknown_parser_is_rejected() {
        let result = DaemonCli::try_parse_from(["sluice", "--parser", "xml"]);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_grok_definition_is_rejected() {
        let result = DaemonCli::try_parse_from(["sluice", "--grok-define", "NOEQUALS"]);
        assert!(result.is_err());
    }

    #[test]
    fn logging_overrides() {
        let cli = parse(&["-v", "--log-format", "pretty", "--pid-file", "/tmp/s.pid"]);
        let mut config = SluiceConfig::default();
        cli.apply_overrides(&mut config);

        assert!(config.general.verbose);
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.general.pid_file, "/tmp/s.pid");
    }

    #[test]
    fn output_overrides() {
        let cli = parse(&[
            "--output",
            "stdout",
            "--output-dir",
            "/srv/out",
            "--shutdown-policy",
            "flush",
            "--tmp-dir",
            "/var/tmp/sluice",
        ]);
        let mut config = SluiceConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.output.kind, OutputKind::Stdout);
        assert_eq!(config.output.dir, "/srv/out");
        assert_eq!(config.batch.shutdown_policy, ShutdownPolicy::Flush);
        assert_eq!(config.batch.tmp_dir, "/var/tmp/sluice");
    }
}
