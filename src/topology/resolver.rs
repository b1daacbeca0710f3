//! Node resolution through splices and component pins.

use crate::error::{HarnessError, Result};
use crate::netlist::{Component, Netlist, NodeId, PinId, SpliceId, TestPointId};

/// How to treat a splice or pin with more than one incident connection when
/// resolving it to a single test point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanoutPolicy {
    /// Take the first connection in document order
    #[default]
    Lenient,
    /// Reject nodes with more than one incident connection
    Strict,
}

/// Read-only view of a netlist for topology queries.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    netlist: &'a Netlist,
    policy: FanoutPolicy,
}

impl<'a> Resolver<'a> {
    pub fn new(netlist: &'a Netlist) -> Self {
        Self::with_policy(netlist, FanoutPolicy::default())
    }

    pub fn with_policy(netlist: &'a Netlist, policy: FanoutPolicy) -> Self {
        Self { netlist, policy }
    }

    pub fn netlist(&self) -> &'a Netlist {
        self.netlist
    }

    pub fn policy(&self) -> FanoutPolicy {
        self.policy
    }

    /// Fail unless the splice was declared.
    pub fn require_splice(&self, splice: SpliceId) -> Result<()> {
        if self.netlist.has_splice(splice) {
            Ok(())
        } else {
            Err(HarnessError::UnknownSplice { splice })
        }
    }

    /// The component owning a pin.
    pub fn component(&self, pin: PinId) -> Result<&'a Component> {
        self.netlist
            .component_for(pin)
            .ok_or(HarnessError::MissingComponent { pin })
    }

    /// Far ends of every connection touching `node`, skipping row `skip`.
    pub fn incident(&self, node: NodeId, skip: Option<usize>) -> impl Iterator<Item = (usize, NodeId)> + 'a {
        let netlist: &'a Netlist = self.netlist;
        netlist
            .connections
            .iter()
            .enumerate()
            .filter(move |(row, _)| Some(*row) != skip)
            .filter_map(move |(row, conn)| conn.other_end(node).map(|far| (row, far)))
    }

    /// Resolve any node to the test point it leads to in one hop.
    pub fn resolve(&self, node: NodeId) -> Result<TestPointId> {
        match node {
            NodeId::TestPoint(tp) => Ok(tp),
            NodeId::Splice(splice) => {
                self.require_splice(splice)?;
                self.single_hop(node)
            }
            NodeId::Pin(pin) => {
                self.component(pin)?;
                self.single_hop(node)
            }
        }
    }

    /// Under [`FanoutPolicy::Strict`], fail when more than one connection
    /// touches `node`.
    pub fn check_fanout(&self, node: NodeId) -> Result<()> {
        if self.policy == FanoutPolicy::Strict {
            let count = self.incident(node, None).count();
            if count > 1 {
                return Err(HarnessError::AmbiguousNode { node, count });
            }
        }
        Ok(())
    }

    fn single_hop(&self, node: NodeId) -> Result<TestPointId> {
        self.check_fanout(node)?;
        let Some((_, far)) = self.incident(node, None).next() else {
            return Err(HarnessError::unresolved(node, "no connection references it"));
        };
        far.as_test_point()
            .ok_or_else(|| HarnessError::unresolved(node, format!("first connection leads to {}", far)))
    }
}
