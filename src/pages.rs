//! HTML bodies for listings, not-found help and server errors.
//!
//! Every interpolated value is escaped; hostnames arrive straight from the
//! client's `Host` header.

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::address::ServiceAddress;
use crate::config::RouterConfig;
use crate::engine::{CandidateListing, NoMatch, NoMatchReason, CONSUL_UI_PORT, NOMAD_UI_PORT};

const HOSTNAME_TIPS: &str = r"
<p>The hostname should be in one of these formats:</p>
<ul>
  <li><b>ServiceName</b>.service.consul</li>
  <li><b>_ServiceName</b>.<b>_PortName</b>.service.consul</li>
  <li><b>ServiceName</b>.service.<b>DatacenterName</b>.consul</li>
  <li><b>_ServiceName</b>.<b>_PortName</b>.service.<b>DatacenterName</b>.consul</li>
</ul>
";

#[must_use]
pub fn listing(listing: &CandidateListing, config: &RouterConfig) -> String {
    let mut body = format!(
        "\n<p>Consul service ports found for service <code>{}</code>{}:</p><ul>\n",
        encode_text(&listing.address.service_name),
        port_type_suffix(&listing.address),
    );

    for candidate in &listing.candidates {
        let tags = candidate.backend.tags.join(", ");
        let tags = if tags.is_empty() {
            tags
        } else {
            format!(" ({tags})")
        };
        // write! to String is infallible
        let _ = writeln!(
            body,
            "<li><a href=\"{}\">{} port {}{}</a></li>",
            encode_double_quoted_attribute(candidate.url.as_str()),
            encode_text(&candidate.hostname),
            candidate.backend.port,
            encode_text(&tags),
        );
    }

    body.push_str("</ul><br />\n");
    body.push_str(&quick_links(&listing.hostname, config));
    body
}

#[must_use]
pub fn not_found(no_match: &NoMatch, config: &RouterConfig) -> String {
    let mut body = match no_match.reason {
        NoMatchReason::NotServiceAddress => format!(
            "\n<p>Could not parse hostname <code>{}</code> as a Consul service address</p>\n",
            encode_text(&no_match.hostname),
        ),
        NoMatchReason::NoInstances(ref address) => format!(
            "\n<p>No results found for service <code>{}</code>{} in Consul</p>\n",
            encode_text(&address.service_name),
            port_type_suffix(address),
        ),
    };
    body.push_str(HOSTNAME_TIPS);
    body.push_str(&quick_links(&no_match.hostname, config));
    body
}

#[must_use]
pub fn server_error(message: &str) -> String {
    format!("\n<p>{}</p>\n", encode_text(message))
}

/// Links to the Nomad and Consul UIs, on the configured aliases when set
/// and on the requested host otherwise.
#[must_use]
pub fn quick_links(hostname: &str, config: &RouterConfig) -> String {
    let nomad = config.nomad_ui_hostname.as_deref().unwrap_or(hostname);
    let consul = config.consul_ui_hostname.as_deref().unwrap_or(hostname);
    format!(
        "\n<p>Quick links:</p>\n<ul>\n\
         <li><a href=\"http://{}:{NOMAD_UI_PORT}/ui/\">Nomad UI</a></li>\n\
         <li><a href=\"http://{}:{CONSUL_UI_PORT}/ui/\">Consul UI</a></li>\n\
         </ul>\n",
        encode_double_quoted_attribute(nomad),
        encode_double_quoted_attribute(consul),
    )
}

fn port_type_suffix(address: &ServiceAddress) -> String {
    if address.has_port_type() {
        format!(" and port type <code>{}</code>", encode_text(&address.port_type))
    } else {
        String::new()
    }
}
