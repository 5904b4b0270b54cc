use crate::layer::arp::BufferedInterface;
use crate::time::Duration;
use crate::wire::{Ipv4Address, Ipv4Datagram};

use super::route::{Route, Routes};

/// Forwards datagrams between interfaces.
///
/// Each datagram is sent out of the interface of the most specific route containing its
/// destination, with its time-to-live reduced by one. Datagrams without a route, or whose
/// time-to-live is spent, are dropped.
#[derive(Debug, Default)]
pub struct Router {
    interfaces: Vec<BufferedInterface>,
    routes: Routes,
}

impl Router {
    /// A router without interfaces or routes.
    pub fn new() -> Self {
        Router::default()
    }

    /// Attach an interface, returning the index routes refer to it by.
    pub fn add_interface(&mut self, interface: BufferedInterface) -> usize {
        self.interfaces.push(interface);
        self.interfaces.len() - 1
    }

    /// Access an attached interface.
    ///
    /// # Panics
    /// This function panics if no interface with that index was added.
    pub fn interface(&self, index: usize) -> &BufferedInterface {
        &self.interfaces[index]
    }

    /// Mutably access an attached interface.
    ///
    /// # Panics
    /// This function panics if no interface with that index was added.
    pub fn interface_mut(&mut self, index: usize) -> &mut BufferedInterface {
        &mut self.interfaces[index]
    }

    /// The number of attached interfaces.
    pub fn interface_count(&self) -> usize {
        self.interfaces.len()
    }

    /// Install a route.
    ///
    /// Datagrams for addresses sharing the first `prefix_len` bits with `prefix` are sent out of
    /// `interface`, to `next_hop` if given or else directly to their destination.
    ///
    /// # Panics
    /// This function panics if the prefix length is larger than 32.
    pub fn add_route(
        &mut self,
        prefix: Ipv4Address,
        prefix_len: u8,
        next_hop: Option<Ipv4Address>,
        interface: usize,
    ) {
        let route = Route::new(prefix, prefix_len, next_hop, interface);
        match next_hop {
            Some(hop) => net_debug!("ip: route {} via {} on interface {}", route.net, hop, interface),
            None => net_debug!("ip: route {} direct on interface {}", route.net, interface),
        }
        self.routes.add_route(route);
    }

    /// The installed routes.
    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    /// Forward a single datagram.
    pub fn route_one_datagram(&mut self, mut datagram: Ipv4Datagram) {
        let destination = datagram.header.dst_addr;
        let route = match self.routes.lookup(destination) {
            Some(route) => *route,
            None => {
                net_trace!("ip: no route for {}", datagram.header);
                return;
            },
        };

        if datagram.header.hop_limit <= 1 {
            net_trace!("ip: time exceeded for {}", datagram.header);
            return;
        }
        datagram.header.hop_limit -= 1;

        let next_hop = route.next_hop_for(destination);
        match self.interfaces.get_mut(route.interface) {
            Some(interface) => interface.send_datagram(datagram, next_hop),
            None => net_debug!("ip: route {} names missing interface {}", route.net, route.interface),
        }
    }

    /// Forward every datagram the interfaces received.
    ///
    /// Interfaces are drained in the order they were added, each in order of arrival.
    pub fn route(&mut self) {
        for index in 0..self.interfaces.len() {
            while let Some(datagram) = self.interfaces[index].datagrams_in().pop_front() {
                self.route_one_datagram(datagram);
            }
        }
    }

    /// Advance the clock of all interfaces.
    pub fn tick(&mut self, elapsed: Duration) {
        for interface in self.interfaces.iter_mut() {
            interface.tick(elapsed);
        }
    }
}
