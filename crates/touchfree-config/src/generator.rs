//! Generate a documented default configuration file

use crate::model::Config;

/// Render `config` as a KDL document with explanatory comments.
///
/// The output parses back to the same [`Config`], so `touchfree init` can
/// write it verbatim and users edit from there.
pub fn generate_default_config(config: &Config) -> String {
    let timing = &config.timing;
    let mut out = String::new();

    out.push_str("// TouchFree client configuration\n");
    out.push_str("// Generated by `touchfree init`.\n\n");

    out.push_str("global {\n");
    out.push_str(&format!(
        "    log-level \"{}\"\n",
        config.global.log_level.as_filter()
    ));
    out.push_str("}\n\n");

    out.push_str("// Where the TouchFree service WebSocket listens\n");
    out.push_str("service {\n");
    out.push_str(&format!("    address \"{}\"\n", config.service.address));
    out.push_str(&format!("    port {}\n", config.service.port));
    out.push_str("}\n\n");

    out.push_str("timing {\n");
    out.push_str("    // Messages are drained from their queues this many times per second\n");
    out.push_str(&format!("    tick-rate {}\n", timing.tick_rate));
    out.push_str("    // Requests without a response are forgotten after the timeout\n");
    out.push_str(&format!(
        "    callback-sweep-interval-ms {}\n",
        timing.callback_sweep_interval.as_millis()
    ));
    out.push_str(&format!(
        "    callback-timeout-ms {}\n",
        timing.callback_timeout.as_millis()
    ));
    out.push_str(&format!(
        "    license-change-timeout-ms {}\n",
        timing.license_change_timeout.as_millis()
    ));
    out.push_str("    // Queued movement beyond this many actions is dropped\n");
    out.push_str(&format!(
        "    input-action-cull-to {}\n",
        timing.input_action_cull_to
    ));
    out.push_str(&format!(
        "    hand-data-min-interval-ms {}\n",
        timing.hand_data_min_interval.as_millis()
    ));
    out.push_str("}\n\n");

    out.push_str("analytics {\n");
    out.push_str(&format!(
        "    application-name \"{}\"\n",
        config.analytics.application_name
    ));
    out.push_str(&format!(
        "    heartbeat-interval-ms {}\n",
        config.analytics.heartbeat_interval.as_millis()
    ));
    out.push_str("}\n");

    out
}
