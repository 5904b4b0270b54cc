//! CIDR routing table, relevant rfc1519, rfc4632.
//!
use crate::wire::{Ipv4Address, Ipv4Subnet};

/// A prefix of addresses that should be sent out of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    /// The network routed through this route.
    ///
    /// Always masked to its prefix length, host bits given at construction are ignored.
    pub net: Ipv4Subnet,

    /// The router to forward to, or `None` when the network is directly attached.
    pub next_hop: Option<Ipv4Address>,

    /// Index of the outgoing interface.
    pub interface: usize,
}

impl Route {
    /// Create a route for all addresses sharing the first `prefix_len` bits with `prefix`.
    ///
    /// # Panics
    /// This function panics if the prefix length is larger than 32.
    pub fn new(
        prefix: Ipv4Address,
        prefix_len: u8,
        next_hop: Option<Ipv4Address>,
        interface: usize,
    ) -> Self {
        Route {
            net: Ipv4Subnet::new(prefix, prefix_len),
            next_hop,
            interface,
        }
    }

    /// Returns a route matching `0.0.0.0/0` via the `gateway`.
    ///
    /// This route is a worst match for all addresses so that it can be used as a sink, for
    /// example.
    pub fn new_ipv4_gateway(gateway: Ipv4Address, interface: usize) -> Self {
        Route {
            net: Ipv4Subnet::ANY,
            next_hop: Some(gateway),
            interface,
        }
    }

    /// The address a datagram for `destination` is handed to on the link.
    pub fn next_hop_for(&self, destination: Ipv4Address) -> Ipv4Address {
        self.next_hop.unwrap_or(destination)
    }
}

/// A routing table.
///
/// # Examples
///
/// ```rust
/// use tern::layer::ip::{Route, Routes};
/// use tern::wire::Ipv4Address;
///
/// let mut routes = Routes::new();
/// routes.add_route(Route::new(Ipv4Address::new(10, 0, 0, 0), 8, None, 0));
/// routes.add_route(Route::new_ipv4_gateway(Ipv4Address::new(192, 168, 0, 1), 1));
///
/// let local = routes.lookup(Ipv4Address::new(10, 2, 3, 4)).unwrap();
/// assert_eq!(local.interface, 0);
/// let remote = routes.lookup(Ipv4Address::new(8, 8, 8, 8)).unwrap();
/// assert_eq!(remote.next_hop_for(Ipv4Address::new(8, 8, 8, 8)), Ipv4Address::new(192, 168, 0, 1));
/// ```
#[derive(Debug, Default, Clone)]
pub struct Routes {
    storage: Vec<Route>,
}

impl Routes {
    /// Creates an empty routing table.
    pub fn new() -> Self {
        Routes::default()
    }

    /// Add a route.
    ///
    /// Overlapping and conflicting routes are accepted. The order of insertion only matters
    /// between routes of the same prefix length.
    pub fn add_route(&mut self, route: Route) {
        self.storage.push(route);
    }

    /// Find the most specific route containing `addr`.
    ///
    /// Among matching routes of equal prefix length the one added first wins.
    pub fn lookup(&self, addr: Ipv4Address) -> Option<&Route> {
        // The rules say to find the subnet with longest prefix.
        let mut best_match: Option<&Route> = None;
        for route in self.storage.iter() {
            if !route.net.contains(addr) {
                continue;
            }

            let best = best_match.get_or_insert(route);
            if best.net.prefix_len() < route.net.prefix_len() {
                *best = route;
            }
        }
        best_match
    }

    /// Iterate over all routes in order of insertion.
    pub fn iter(&self) -> impl Iterator<Item=&Route> + '_ {
        self.storage.iter()
    }

    /// The number of installed routes.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether no route is installed.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}
