//! Verify command: DNS propagation across public resolvers

use crate::cli::output::{format_propagation_json, format_propagation_table};
use crate::cli::run::{build_provider, init_cli_tracing, load_config};
use crate::cli::VerifyArgs;
use crate::provider::DnsProvider;
use crate::verify::PropagationChecker;
use std::time::Duration;

/// Handle `dns-failover verify` command
///
/// Without `--expect`, the expected address is the live record value.
/// With `--wait`, fails if the record has not propagated in time.
pub async fn handle_verify(args: &VerifyArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config(&args.config)?;
    if config.provider.domain_name.trim().is_empty() {
        return Err(crate::config::ConfigError::MissingField("provider.domain_name".into()).into());
    }
    init_cli_tracing();

    let expected = match &args.expect {
        Some(expected) => expected.clone(),
        None => {
            let provider = build_provider(&config, true)?;
            match provider.get_record(&config.record_key()).await? {
                Some(record) => record.value,
                None => {
                    return Err(format!(
                        "record {} does not exist; pass --expect",
                        config.record_key()
                    )
                    .into())
                }
            }
        }
    };

    let checker = PropagationChecker::new(config.verify.clone())?;
    let domain = &config.provider.domain_name;
    let record_type = config.dns.record_type;

    let report = match args.wait {
        Some(seconds) => {
            checker
                .wait_for(domain, record_type, &expected, Duration::from_secs(seconds))
                .await
        }
        None => checker.check_expected(domain, record_type, &expected).await,
    };

    let output = if args.json {
        format_propagation_json(&report)?
    } else {
        format_propagation_table(&report)
    };

    if args.wait.is_some() && !report.propagated {
        println!("{}", output);
        return Err(format!(
            "{} has not propagated after {}s",
            expected, report.elapsed_seconds
        )
        .into());
    }

    Ok(output)
}
