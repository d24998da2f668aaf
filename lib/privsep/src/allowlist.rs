use regex::Regex;

/// The exact set of path patterns the monitor will `open()` on the worker's
/// behalf (section 4.2.1), taken from `asroot_open`'s literal allowlist.
/// Patterns are unanchored, same as the original's plain `regexec` call.
const PATTERNS: &[&str] = &[
    r"/proc/sys/net/ipv4/ip_forward",
    r"/proc/net/bonding/[^.][^/]*",
    r"/proc/self/net/bonding/[^.][^/]*",
    r"/sys/class/net/[^.][^/]*/brforward",
    r"/sys/class/net/[^.][^/]*/brport",
    r"/sys/class/net/[^.][^/]*/brif/[^.][^/]*/port_no",
    r"/sys/class/dmi/id/product_version",
    r"/sys/class/dmi/id/product_serial",
    r"/sys/class/dmi/id/product_name",
    r"/sys/class/dmi/id/bios_version",
    r"/sys/class/dmi/id/sys_vendor",
    r"/sys/class/dmi/id/chassis_asset_tag",
];

/// Compiled form of [`PATTERNS`], built once at monitor startup ("the
/// monitor compiles each pattern once and refuses any unmatched request").
pub struct Allowlist {
    compiled: Vec<Regex>,
}

impl Allowlist {
    pub fn compiled() -> Self {
        let compiled = PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern).expect("allowlist pattern must compile"))
            .collect();
        Allowlist { compiled }
    }

    pub fn allows(&self, path: &str) -> bool {
        self.compiled.iter().any(|re| re.is_match(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_bonding_status_file() {
        let allowlist = Allowlist::compiled();
        assert!(allowlist.allows("/proc/net/bonding/bond0"));
        assert!(allowlist.allows("/proc/self/net/bonding/bond0"));
    }

    #[test]
    fn allows_dmi_fields() {
        let allowlist = Allowlist::compiled();
        assert!(allowlist.allows("/sys/class/dmi/id/product_name"));
    }

    #[test]
    fn denies_arbitrary_paths() {
        let allowlist = Allowlist::compiled();
        assert!(!allowlist.allows("/etc/shadow"));
        assert!(!allowlist.allows("/proc/net/bonding/../../../etc/shadow"));
    }
}
