/*
    Copyright 2025 MydriaTech AB

    Licensed under the Apache License 2.0 with Free world makers exception
    1.0.0 (the "License"); you may not use this file except in compliance with
    the License. You should have obtained a copy of the License with the source
    or binary distribution in file named

        LICENSE-Apache-2.0-with-FWM-Exception-1.0.0

    Unless required by applicable law or agreed to in writing, software
    distributed under the License is distributed on an "AS IS" BASIS,
    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
    See the License for the specific language governing permissions and
    limitations under the License.
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use idqlsync_core::AppConfig;
use idqlsync_core::PolicyReconciler;
use idqlsync_core::backend::policy_provider_from_config;
use idqlsync_pp::pp::ApplicationContext;
use std::process::ExitCode;

/// Application main entrypoint.
fn main() -> ExitCode {
    if let Err(e) = init_logger() {
        println!("Failed to initialize logging: {e:?}");
        return ExitCode::FAILURE;
    }
    #[cfg(feature = "tracing")]
    let _guard = {
        // Enable tracing via the RUST_LOG environment variable. Example:
        //
        // ```
        // RUST_LOG="aws_smithy_runtime=debug,aws_sdk_dynamodb=trace"
        // ```
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
            .with_writer(non_blocking)
            .init();
        guard
    };
    let command = std::env::args().nth(1).unwrap_or_else(|| "sync".to_string());
    if !matches!(command.as_str(), "sync" | "export") {
        println!(
            "{name} - Push IDQL policies into policy backends

Usage:
    {name} [sync|export]
",
            name = env!("CARGO_PKG_NAME")
        );
        return ExitCode::FAILURE;
    }
    let app_config = match AppConfig::new(env!("CARGO_PKG_NAME")) {
        Ok(app_config) => app_config,
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "Starting {} {}.",
        app_config.app_name_lowercase(),
        app_config.app_version()
    );
    match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(run_async(&app_config, &command)),
        Err(e) => {
            log::error!("Failed to start async runtime: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize the logging system and apply filters.
fn init_logger() -> Result<(), log::SetLoggerError> {
    env_logger::builder()
        // Set default log level
        .filter_level(log::LevelFilter::Info)
        // Customize logging for dependencies
        .filter(Some("aws_config"), log::LevelFilter::Warn)
        .filter(Some("aws_smithy_runtime"), log::LevelFilter::Warn)
        .filter(Some("hyper_util"), log::LevelFilter::Info)
        .filter(Some("rustls::client"), log::LevelFilter::Info)
        .filter(Some("reqwest::connect"), log::LevelFilter::Info)
        .write_style(env_logger::fmt::WriteStyle::Auto)
        .target(env_logger::fmt::Target::Stdout)
        .is_test(false)
        .parse_env(
            env_logger::Env::new()
                .filter("LOG_LEVEL")
                .write_style("LOG_STYLE"),
        )
        .try_init()
}

/// Async code entry point.
async fn run_async(app_config: &AppConfig, command: &str) -> ExitCode {
    let policy_provider = match policy_provider_from_config(app_config).await {
        Ok(policy_provider) => policy_provider,
        Err(e) => {
            log::error!("Failed to set up policy backend: {e}");
            return ExitCode::FAILURE;
        }
    };
    let application = app_config.policy.application();
    let app_context = ApplicationContext::new(application, application);
    let reconciler = PolicyReconciler::new(policy_provider);
    let res = if command == "export" {
        reconciler
            .export(&app_context)
            .await
            .and_then(|policies| policies.as_json())
            .map(|json| println!("{json}"))
    } else {
        match PolicyReconciler::load_policies(app_config.policy.file()).await {
            Ok(policies) => reconciler
                .reconcile(&app_context, &policies.policies)
                .await
                .map(|report| log::info!("Done. {report}")),
            Err(e) => Err(e),
        }
    };
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
