//! Show the detected host profile

use service_facts::{Config, EnablementSource, HostProfile, StatusSource};

pub fn profile(config: &Config) {
    let profile = HostProfile::detect(&config.root);

    println!("Host:      {}", profile);
    println!("Systemd:   {}", if profile.uses_systemd() { "yes" } else { "no" });
    println!();

    println!("Enablement sources:");
    for source in EnablementSource::ORDER {
        let mark = if source.applies(&profile) { "●" } else { "○" };
        println!("  {} {}", mark, source.as_str());
    }

    println!("Status sources:");
    for source in StatusSource::ORDER {
        let mark = if source.applies(&profile) { "●" } else { "○" };
        println!("  {} {}", mark, source.as_str());
    }
}
