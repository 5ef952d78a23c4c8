//! Process-wide deployment config. Kept in its own test binary so nothing else installs it first.

use cashper_gate::config::{self, DeploymentConfig};
use cashper_gate::endpoints::{resolve, Capability};

#[test]
fn first_install_wins_for_the_process() {
    let first = config::init_global(DeploymentConfig::remote("https://api-a.example.com"));
    assert_eq!(first, &DeploymentConfig::remote("https://api-a.example.com"));

    let second = config::init_global(DeploymentConfig::remote("https://api-b.example.com"));
    assert_eq!(second, &DeploymentConfig::remote("https://api-a.example.com"));
    assert_eq!(config::global(), &DeploymentConfig::remote("https://api-a.example.com"));

    let table = resolve(config::global());
    assert_eq!(table.url(Capability::Dashboard), "https://api-a.example.com/api/dashboard");
}
