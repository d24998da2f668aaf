use marshal::{GraphNode, NodeRef};
use model::{Chassis, Port, Vlan};

/// Renders one interface's discovered state the way `lldpctl`'s plain-text
/// mode does: a header line, the local port, the local chassis, and any
/// VLANs riding that interface. A missing port or chassis means the daemon
/// doesn't track that interface (yet); printed as "unknown" rather than
/// skipped, so the interface list and the detail sections always line up.
pub fn print_interface(ifname: &str, port: Option<&NodeRef>, chassis: Option<&NodeRef>, vlans: &[Vlan]) {
    println!("interface: {}", ifname);

    match port.and_then(|node| downcast::<Port>(node, |p| format_port(p))) {
        Some(rendered) => println!("{}", rendered),
        None => println!("  port: unknown"),
    }

    match chassis.and_then(|node| downcast::<Chassis>(node, |c| format_chassis(c))) {
        Some(rendered) => println!("{}", rendered),
        None => println!("  chassis: unknown"),
    }

    if vlans.is_empty() {
        println!("  vlans: none");
    } else {
        for vlan in vlans {
            println!("  vlan: {} ({})", vlan.vid, vlan.name);
        }
    }
    println!();
}

fn downcast<T: 'static>(node: &NodeRef, render: impl FnOnce(&T) -> String) -> Option<String> {
    let borrowed = node.borrow();
    borrowed.as_any().downcast_ref::<T>().map(render)
}

fn format_port(port: &Port) -> String {
    format!(
        "  port: {} (aggregation_id={}, max_frame_size={})",
        port.description, port.aggregation_id, port.max_frame_size
    )
}

fn format_chassis(chassis: &Chassis) -> String {
    format!(
        "  chassis: {} ({}) caps_available={:?}",
        chassis.name, chassis.description, chassis.cap_available
    )
}
