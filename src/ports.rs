//! Port registration and dispatch
//!
//! This module keeps the list of port backends compiled into the binary and
//! opens them from `name[:key=value,...]` strings.

use std::sync::Arc;

use pinforge_core::port::Port;

/// Information about a port backend
pub struct PortInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available port backends (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_ports() -> Vec<PortInfo> {
    let mut ports = Vec::new();

    #[cfg(feature = "dummy")]
    ports.push(PortInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory pins for testing (pins=<n>,offset=<id>,inputonly=<n>,missing=<n>)",
    });

    #[cfg(feature = "linux-gpio")]
    ports.push(PortInfo {
        name: "linux_gpio",
        aliases: &["linux-gpio", "gpiochip"],
        description: "Linux GPIO character device (dev=/dev/gpiochipN or gpiochip=N,offset=<id>)",
    });

    ports
}

/// Generate help text listing all available port backends
pub fn port_help() -> String {
    let ports = available_ports();

    if ports.is_empty() {
        return "No ports available (recompile with port features enabled)".to_string();
    }

    let mut help = String::from("Available ports:\n");
    for p in &ports {
        help.push_str(&format!("  {:12} - {}\n", p.name, p.description));
    }
    help
}

/// Resolve a name or alias to the primary name of an available port
pub fn find_port(name: &str) -> Option<&'static str> {
    available_ports()
        .into_iter()
        .find(|p| p.name == name || p.aliases.contains(&name))
        .map(|p| p.name)
}

/// Parse a port string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_port_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

/// Open the port described by `port`
#[allow(unused_variables)]
pub fn open_port(port: &str) -> Result<Arc<dyn Port>, Box<dyn std::error::Error>> {
    let (name, options) = parse_port_string(port);

    let canonical_name = match find_port(name) {
        Some(n) => n,
        None => return Err(unknown_port_error(name)),
    };

    match canonical_name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            let port = pinforge_dummy::open_dummy_port(&options)
                .map_err(|e| format!("Invalid dummy parameters: {}", e))?;
            Ok(port)
        }

        #[cfg(feature = "linux-gpio")]
        "linux_gpio" => {
            log::info!("Opening Linux GPIO port...");
            let port = pinforge_linux_gpio::open_linux_gpio_port(&options).map_err(|e| {
                format!(
                    "Failed to open Linux GPIO port: {}\n\
                     Make sure the device exists and you have read/write permissions.\n\
                     You may need to: sudo usermod -aG gpio $USER",
                    e
                )
            })?;
            Ok(port)
        }

        _ => Err(unknown_port_error(name)),
    }
}

fn unknown_port_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown port: {}\n\n", name);
    msg.push_str(&port_help());
    msg.push_str("\nUse 'pinforge list-ports' for more details");
    msg.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_string() {
        assert_eq!(parse_port_string("dummy"), ("dummy", vec![]));
        assert_eq!(
            parse_port_string("linux_gpio:gpiochip=1,offset=32"),
            ("linux_gpio", vec![("gpiochip", "1"), ("offset", "32")])
        );
        // entries without '=' are ignored
        assert_eq!(
            parse_port_string("dummy:pins=4,junk"),
            ("dummy", vec![("pins", "4")])
        );
    }

    #[cfg(feature = "linux-gpio")]
    #[test]
    fn test_find_port_alias() {
        assert_eq!(find_port("gpiochip"), Some("linux_gpio"));
        assert_eq!(find_port("linux_gpio"), Some("linux_gpio"));
    }

    #[test]
    fn test_unknown_port() {
        assert!(find_port("nope").is_none());
        assert!(open_port("nope:pins=1").is_err());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy() {
        let port = open_port("dummy:pins=3,offset=10").unwrap();
        assert_eq!(port.pin_count(), 3);
        assert!(port.exists(12));
        assert!(!port.exists(13));
        assert!(open_port("dummy:pins=0").is_err());
    }
}
