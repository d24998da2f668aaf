use privsep::PrivClient;

use crate::error::ClassifyResult;

/// Parses the kernel's `/proc/net/bonding/<master>` text as a two-state
/// machine (section 4.3): look for `Slave Interface: <slave>`, then for the
/// following `Permanent HW addr: <mac>` -- this is the slave's true MAC, as
/// distinct from the bond's one shared MAC reported by the kernel on the
/// slave itself.
pub fn parse_permanent_mac(contents: &str, slave: &str) -> Option<[u8; 6]> {
    const SLAVE_PREFIX: &str = "Slave Interface: ";
    const HWADDR_PREFIX: &str = "Permanent HW addr: ";

    let mut found_slave = false;
    for line in contents.lines() {
        if !found_slave {
            if let Some(name) = line.strip_prefix(SLAVE_PREFIX) {
                if name == slave {
                    found_slave = true;
                }
            }
        } else if let Some(mac_str) = line.strip_prefix(HWADDR_PREFIX) {
            return parse_mac(mac_str);
        }
    }
    None
}

fn parse_mac(text: &str) -> Option<[u8; 6]> {
    let mut mac = [0u8; 6];
    let mut parts = text.split(':');
    for slot in mac.iter_mut() {
        *slot = u8::from_str_radix(parts.next()?, 16).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(mac)
}

/// Resolves `slave`'s permanent MAC by opening `/proc/net/bonding/<master>`
/// (falling back to `/proc/self/net/bonding/<master>`) through the monitor
/// and running [`parse_permanent_mac`] over its contents.
pub fn resolve_permanent_mac(
    priv_client: &mut PrivClient,
    master: &str,
    slave: &str,
) -> ClassifyResult<Option<[u8; 6]>> {
    use std::io::Read;

    let primary = format!("/proc/net/bonding/{}", master);
    let fallback = format!("/proc/self/net/bonding/{}", master);

    let fd = match priv_client.open(&primary) {
        Ok(fd) => fd,
        Err(_) => priv_client.open(&fallback)?,
    };

    let mut file = std::fs::File::from(fd);
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    Ok(parse_permanent_mac(&contents, slave))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Slave Interface: eth0\nPermanent HW addr: aa:bb:cc:dd:ee:01\nSlave Interface: eth1\nPermanent HW addr: aa:bb:cc:dd:ee:02\n";

    #[test]
    fn finds_the_first_slaves_mac() {
        let mac = parse_permanent_mac(SAMPLE, "eth0").unwrap();
        assert_eq!(mac, [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01]);
    }

    #[test]
    fn finds_the_second_slaves_mac() {
        let mac = parse_permanent_mac(SAMPLE, "eth1").unwrap();
        assert_eq!(mac, [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x02]);
    }

    #[test]
    fn unknown_slave_name_yields_none() {
        assert!(parse_permanent_mac(SAMPLE, "eth2").is_none());
    }

    #[test]
    fn malformed_mac_line_yields_none() {
        let text = "Slave Interface: eth0\nPermanent HW addr: not-a-mac\n";
        assert!(parse_permanent_mac(text, "eth0").is_none());
    }
}
