use super::*;
use crate::layer::arp::{BufferedInterface, Interface};
use crate::wire::{ArpOperation, ArpRepr, Checksum, IpProtocol};
use crate::wire::{EthernetAddress, EthernetFrame, EthernetProtocol, EthernetRepr};
use crate::wire::{Ipv4Address, Ipv4Datagram, Ipv4Repr};

const MAC_ADDR_LAN: EthernetAddress = EthernetAddress([0x02, 0, 0, 0, 1, 1]);
const IP_ADDR_LAN: Ipv4Address = Ipv4Address::new(10, 0, 0, 1);
const MAC_ADDR_SITE: EthernetAddress = EthernetAddress([0x02, 0, 0, 0, 2, 1]);
const IP_ADDR_SITE: Ipv4Address = Ipv4Address::new(192, 168, 1, 1);
const MAC_ADDR_UPLINK: EthernetAddress = EthernetAddress([0x02, 0, 0, 0, 3, 1]);
const IP_ADDR_UPLINK: Ipv4Address = Ipv4Address::new(172, 16, 0, 1);

const SITE_GATEWAY: Ipv4Address = Ipv4Address::new(192, 168, 1, 254);
const UPLINK_GATEWAY: Ipv4Address = Ipv4Address::new(172, 16, 0, 254);

const MAC_ADDR_HOST: EthernetAddress = EthernetAddress([0x02, 0, 0, 0, 1, 2]);
const IP_ADDR_HOST: Ipv4Address = Ipv4Address::new(10, 0, 0, 2);

const LAN: usize = 0;
const SITE: usize = 1;
const UPLINK: usize = 2;

fn router() -> Router {
    let mut router = Router::new();
    assert_eq!(router.add_interface(BufferedInterface::new(Interface::new(MAC_ADDR_LAN, IP_ADDR_LAN))), LAN);
    assert_eq!(router.add_interface(BufferedInterface::new(Interface::new(MAC_ADDR_SITE, IP_ADDR_SITE))), SITE);
    assert_eq!(router.add_interface(BufferedInterface::new(Interface::new(MAC_ADDR_UPLINK, IP_ADDR_UPLINK))), UPLINK);

    router.add_route(Ipv4Address::new(10, 0, 0, 0), 24, None, LAN);
    router.add_route(Ipv4Address::new(192, 168, 0, 0), 16, Some(SITE_GATEWAY), SITE);
    router.add_route(Ipv4Address::new(0, 0, 0, 0), 0, Some(UPLINK_GATEWAY), UPLINK);
    // More specific than the site route, installed after it.
    router.add_route(Ipv4Address::new(192, 168, 7, 0), 24, None, UPLINK);
    router
}

fn datagram(dst_addr: Ipv4Address, hop_limit: u8) -> Ipv4Datagram {
    Ipv4Datagram {
        header: Ipv4Repr {
            src_addr: Ipv4Address::new(10, 0, 0, 77),
            dst_addr,
            protocol: IpProtocol::Udp,
            hop_limit,
            ident: 0x1234,
        },
        payload: vec![0xaa, 0x00, 0x00, 0xff],
    }
}

/// Let an interface learn the hardware address of a neighbor.
fn teach(router: &mut Router, index: usize, protocol_addr: Ipv4Address, hardware_addr: EthernetAddress) {
    let interface = router.interface_mut(index);
    let own_mac = interface.interface().ethernet_address();
    let own_ip = interface.interface().ip_address();
    let reply = ArpRepr {
        operation: ArpOperation::Reply,
        source_hardware_addr: hardware_addr,
        source_protocol_addr: protocol_addr,
        target_hardware_addr: own_mac,
        target_protocol_addr: own_ip,
    };
    interface.recv_frame(&EthernetFrame {
        header: EthernetRepr {
            dst_addr: own_mac,
            src_addr: hardware_addr,
            ethertype: EthernetProtocol::Arp,
        },
        payload: reply.serialize(),
    });
    assert!(interface.frames_out().is_empty());
}

fn sent_datagram(router: &mut Router, index: usize) -> (EthernetAddress, Ipv4Datagram) {
    let frame = router.interface_mut(index).frames_out().pop_front().expect("a forwarded frame");
    assert_eq!(frame.header.ethertype, EthernetProtocol::Ipv4);
    let datagram = Ipv4Datagram::parse(&frame.payload, Checksum::Manual).expect("valid IPv4");
    (frame.header.dst_addr, datagram)
}

fn assert_silent(router: &mut Router) {
    for index in 0..router.interface_count() {
        assert!(router.interface_mut(index).frames_out().is_empty(), "interface {} sent", index);
    }
}

#[test]
fn expired_is_dropped() {
    let mut router = router();
    teach(&mut router, LAN, IP_ADDR_HOST, MAC_ADDR_HOST);

    router.route_one_datagram(datagram(IP_ADDR_HOST, 1));
    router.route_one_datagram(datagram(IP_ADDR_HOST, 0));
    assert_silent(&mut router);
}

#[test]
fn direct_route_to_destination() {
    let mut router = router();
    teach(&mut router, LAN, IP_ADDR_HOST, MAC_ADDR_HOST);

    router.route_one_datagram(datagram(IP_ADDR_HOST, 64));
    let (dst_mac, forwarded) = sent_datagram(&mut router, LAN);
    assert_eq!(dst_mac, MAC_ADDR_HOST);
    assert_eq!(forwarded.header.hop_limit, 63);
    assert_eq!(forwarded.header.dst_addr, IP_ADDR_HOST);
    assert_eq!(forwarded.payload, datagram(IP_ADDR_HOST, 64).payload);
    assert_silent(&mut router);
}

#[test]
fn gateway_is_resolved() {
    let mut router = router();

    let destination = Ipv4Address::new(192, 168, 5, 5);
    router.route_one_datagram(datagram(destination, 10));

    // The gateway is looked up, not the destination.
    let frame = router.interface_mut(SITE).frames_out().pop_front().expect("an ARP request");
    assert_eq!(frame.header.dst_addr, EthernetAddress::BROADCAST);
    let request = ArpRepr::parse_bytes(&frame.payload).expect("valid ARP");
    assert_eq!(request.operation, ArpOperation::Request);
    assert_eq!(request.target_protocol_addr, SITE_GATEWAY);
    assert_eq!(router.interface(SITE).interface().pending_len(), 1);

    let gateway_mac = EthernetAddress([0x02, 0, 0, 0, 2, 0xfe]);
    teach(&mut router, SITE, SITE_GATEWAY, gateway_mac);
    let (dst_mac, forwarded) = sent_datagram(&mut router, SITE);
    assert_eq!(dst_mac, gateway_mac);
    assert_eq!(forwarded.header.dst_addr, destination);
    assert_eq!(forwarded.header.hop_limit, 9);
}

#[test]
fn longest_prefix() {
    let mut router = router();
    let site_gateway_mac = EthernetAddress([0x02, 0, 0, 0, 2, 0xfe]);
    let uplink_host = Ipv4Address::new(192, 168, 7, 9);
    let uplink_host_mac = EthernetAddress([0x02, 0, 0, 0, 3, 9]);
    teach(&mut router, SITE, SITE_GATEWAY, site_gateway_mac);
    teach(&mut router, UPLINK, uplink_host, uplink_host_mac);

    router.route_one_datagram(datagram(uplink_host, 64));
    let (dst_mac, _) = sent_datagram(&mut router, UPLINK);
    assert_eq!(dst_mac, uplink_host_mac);

    router.route_one_datagram(datagram(Ipv4Address::new(192, 168, 8, 1), 64));
    let (dst_mac, _) = sent_datagram(&mut router, SITE);
    assert_eq!(dst_mac, site_gateway_mac);
    assert_silent(&mut router);
}

#[test]
fn default_route() {
    let mut router = router();
    let uplink_gateway_mac = EthernetAddress([0x02, 0, 0, 0, 3, 0xfe]);
    teach(&mut router, UPLINK, UPLINK_GATEWAY, uplink_gateway_mac);

    let destination = Ipv4Address::new(8, 8, 8, 8);
    router.route_one_datagram(datagram(destination, 2));
    let (dst_mac, forwarded) = sent_datagram(&mut router, UPLINK);
    assert_eq!(dst_mac, uplink_gateway_mac);
    assert_eq!(forwarded.header.dst_addr, destination);
    assert_eq!(forwarded.header.hop_limit, 1);
}

#[test]
fn no_route() {
    let mut router = Router::new();
    router.add_interface(BufferedInterface::new(Interface::new(MAC_ADDR_LAN, IP_ADDR_LAN)));
    router.add_route(Ipv4Address::new(10, 0, 0, 0), 24, None, LAN);
    // Refers to an interface that was never added.
    router.add_route(Ipv4Address::new(10, 9, 0, 0), 16, None, 7);

    router.route_one_datagram(datagram(Ipv4Address::new(8, 8, 8, 8), 64));
    router.route_one_datagram(datagram(Ipv4Address::new(10, 9, 1, 1), 64));
    assert_silent(&mut router);
    assert_eq!(router.routes().len(), 2);
}

#[test]
fn route_drains_interfaces() {
    let mut router = router();
    teach(&mut router, LAN, IP_ADDR_HOST, MAC_ADDR_HOST);

    for hop_limit in [30, 1, 20].iter().copied() {
        let inbound = datagram(IP_ADDR_HOST, hop_limit);
        router.interface_mut(SITE).recv_frame(&EthernetFrame {
            header: EthernetRepr {
                dst_addr: MAC_ADDR_SITE,
                src_addr: EthernetAddress([0x02, 0, 0, 0, 2, 0xfe]),
                ethertype: EthernetProtocol::Ipv4,
            },
            payload: inbound.serialize(),
        });
    }
    assert_eq!(router.interface_mut(SITE).datagrams_in().len(), 3);

    router.route();
    assert!(router.interface_mut(SITE).datagrams_in().is_empty());

    let (_, first) = sent_datagram(&mut router, LAN);
    let (_, second) = sent_datagram(&mut router, LAN);
    assert_eq!(first.header.hop_limit, 29);
    assert_eq!(second.header.hop_limit, 19);
    assert_silent(&mut router);
}
