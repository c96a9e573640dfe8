use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::{
    dsp::AudioParam,
    error::GraphError,
    graph::node::{GraphNode, NodeId, ParamInputs, ParamKind, RenderCtx, StereoBlock},
    RENDER_QUANTUM,
};

/*
Audio Graph
===========

Nodes live in an arena of slots. A NodeId is (slot index, generation); the
generation bumps when a node is removed, so ids held by the control thread
go stale instead of aliasing whatever reuses the slot.

Edges go from a node's output either to another node's input or to one of
its params:

    ┌────────┐   Input    ┌──────┐   Input    ┌─────────────┐
    │ noise  ├───────────►│  LP  ├───────────►│ destination │
    └────────┘            └──────┘            └─────────────┘
                              ▲ Param(Frequency)
    ┌────────┐   Input    ┌───┴──┐
    │  LFO   ├───────────►│ x600 │
    └────────┘            └──────┘

Rendering one quantum:

  1. If edges changed, rebuild a topological order (Kahn's algorithm) and
     the list of feeds into each node.
  2. Visit nodes in order. Sum every Input feed into one stereo block and
     every Param feed into that param's modulation buffer, then process.
  3. The destination's block is what the device hears.

`connect` refuses edges that would close a loop, so the order always
covers every live node. Nodes that nothing reaches from the destination
still render; a source playing into nothing simply goes unheard.

The graph is shared with the audio callback behind a mutex (see
[`SharedGraph`]); the control thread edits it in short critical sections.
*/

/// Graph shared between the control thread and the audio callback.
pub type SharedGraph = Arc<Mutex<AudioGraph>>;

/// Lock the graph. A panic on the other side of the lock leaves the graph
/// structurally valid, so a poisoned lock is recovered rather than spread.
pub fn lock_graph(graph: &SharedGraph) -> MutexGuard<'_, AudioGraph> {
    graph.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Where a connection lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Input(NodeId),
    Param(NodeId, ParamKind),
}

impl Edge {
    pub fn target(&self) -> NodeId {
        match *self {
            Edge::Input(node) | Edge::Param(node, _) => node,
        }
    }
}

struct Entry {
    node: Box<dyn GraphNode>,
    edges: Vec<Edge>,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Clone, Copy)]
struct Feed {
    from: usize,
    param: Option<ParamKind>,
}

/// Passes its summed input straight to the device.
struct Destination;

impl GraphNode for Destination {
    fn process(
        &mut self,
        input: &StereoBlock,
        _params: &ParamInputs,
        out: &mut StereoBlock,
        _ctx: &RenderCtx,
    ) {
        out.left.copy_from_slice(&input.left);
        out.right.copy_from_slice(&input.right);
    }

    fn name(&self) -> &'static str {
        "destination"
    }
}

pub struct AudioGraph {
    sample_rate: f32,
    frames: u64,
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    destination: NodeId,

    order: Vec<usize>,
    feeds: Vec<Vec<Feed>>,
    dirty: bool,

    outputs: Vec<StereoBlock>,
    input: StereoBlock,
    params: ParamInputs,
    /// Next frame of the destination block to hand out
    cursor: usize,
}

impl AudioGraph {
    pub fn new(sample_rate: f32) -> Self {
        let mut graph = Self {
            sample_rate,
            frames: 0,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            destination: NodeId {
                index: 0,
                generation: 0,
            },
            order: Vec::new(),
            feeds: Vec::new(),
            dirty: true,
            outputs: Vec::new(),
            input: StereoBlock::new(),
            params: ParamInputs::new(),
            cursor: RENDER_QUANTUM,
        };
        graph.destination = graph.add(Destination);
        graph
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Audio-clock time in seconds: frames rendered so far.
    pub fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    pub fn destination(&self) -> NodeId {
        self.destination
    }

    /// Live nodes, including the destination.
    pub fn node_count(&self) -> usize {
        self.live
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entry(id).is_ok()
    }

    pub fn node_name(&self, id: NodeId) -> Result<&'static str, GraphError> {
        Ok(self.entry(id)?.node.name())
    }

    pub fn add<N: GraphNode + 'static>(&mut self, node: N) -> NodeId {
        let entry = Entry {
            node: Box::new(node),
            edges: Vec::new(),
        };
        self.live += 1;
        self.dirty = true;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        self.outputs.push(StereoBlock::new());
        self.feeds.push(Vec::new());
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Route `from`'s output into `to`'s input.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.add_edge(from, Edge::Input(to))
    }

    /// Route `from`'s output into a parameter of `to`, where it is added to
    /// the parameter's own value.
    pub fn connect_param(
        &mut self,
        from: NodeId,
        to: NodeId,
        param: ParamKind,
    ) -> Result<(), GraphError> {
        if self.entry(to)?.node.param(param).is_none() {
            return Err(GraphError::NoSuchParam { node: to, param });
        }
        self.add_edge(from, Edge::Param(to, param))
    }

    /// Drop every outgoing connection of `id`.
    pub fn disconnect(&mut self, id: NodeId) -> Result<(), GraphError> {
        let entry = self.entry_mut(id)?;
        if !entry.edges.is_empty() {
            entry.edges.clear();
            self.dirty = true;
        }
        Ok(())
    }

    /// Whether `from` feeds `to`'s input or any of its params.
    pub fn is_connected(&self, from: NodeId, to: NodeId) -> bool {
        self.entry(from)
            .map(|entry| entry.edges.iter().any(|edge| edge.target() == to))
            .unwrap_or(false)
    }

    pub fn outputs(&self, id: NodeId) -> Result<&[Edge], GraphError> {
        Ok(&self.entry(id)?.edges)
    }

    /// Schedule a source to begin at `when` (audio-clock seconds).
    pub fn start(&mut self, id: NodeId, when: f64) -> Result<(), GraphError> {
        let schedule = self
            .entry_mut(id)?
            .node
            .schedule_mut()
            .ok_or(GraphError::NotASource(id))?;
        if schedule.is_started() {
            return Err(GraphError::AlreadyStarted(id));
        }
        schedule.set_start(when);
        Ok(())
    }

    /// Schedule a started source to fall silent at `when`.
    pub fn stop(&mut self, id: NodeId, when: f64) -> Result<(), GraphError> {
        let schedule = self
            .entry_mut(id)?
            .node
            .schedule_mut()
            .ok_or(GraphError::NotASource(id))?;
        if !schedule.is_started() {
            return Err(GraphError::NotStarted(id));
        }
        schedule.set_stop(when);
        Ok(())
    }

    /// Release a node. Its connections and every connection into it are
    /// dropped, and `id` becomes stale.
    pub fn remove(&mut self, id: NodeId) -> Result<(), GraphError> {
        if id == self.destination {
            return Err(GraphError::RemoveDestination);
        }
        let name = self.node_name(id)?;

        let slot = &mut self.slots[id.index as usize];
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;

        for slot in &mut self.slots {
            if let Some(entry) = slot.entry.as_mut() {
                entry.edges.retain(|edge| edge.target() != id);
            }
        }
        self.dirty = true;
        trace!(node = %id, name, "node released");
        Ok(())
    }

    pub fn param(&self, id: NodeId, kind: ParamKind) -> Result<&AudioParam, GraphError> {
        self.entry(id)?
            .node
            .param(kind)
            .ok_or(GraphError::NoSuchParam {
                node: id,
                param: kind,
            })
    }

    pub fn param_mut(&mut self, id: NodeId, kind: ParamKind) -> Result<&mut AudioParam, GraphError> {
        self.entry_mut(id)?
            .node
            .param_mut(kind)
            .ok_or(GraphError::NoSuchParam {
                node: id,
                param: kind,
            })
    }

    pub fn is_generating(&self, id: NodeId) -> Result<bool, GraphError> {
        let now = self.current_time();
        Ok(self.entry(id)?.node.is_generating(now))
    }

    /// Sources that are started and not yet stopped or finished.
    pub fn active_generators(&self) -> usize {
        let now = self.current_time();
        self.slots
            .iter()
            .filter_map(|slot| slot.entry.as_ref())
            .filter(|entry| entry.node.is_generating(now))
            .count()
    }

    /// Fill an interleaved buffer with `channels` channels. Mono output is
    /// the average of left and right; channels past the second are silent.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let dest = self.destination.index as usize;

        for frame in out.chunks_mut(channels.max(1)) {
            if self.cursor == RENDER_QUANTUM {
                self.render_quantum();
                self.cursor = 0;
            }

            let block = &self.outputs[dest];
            let (left, right) = (block.left[self.cursor], block.right[self.cursor]);
            match frame {
                [mono] => *mono = 0.5 * (left + right),
                [l, r, rest @ ..] => {
                    *l = left;
                    *r = right;
                    rest.fill(0.0);
                }
                [] => {}
            }
            self.cursor += 1;
        }
    }

    fn render_quantum(&mut self) {
        self.refresh_order();
        let ctx = RenderCtx::new(self.sample_rate, self.current_time());

        for position in 0..self.order.len() {
            let index = self.order[position];
            self.input.clear();
            self.params.clear();

            for feed in &self.feeds[index] {
                let source = &self.outputs[feed.from];
                match feed.param {
                    None => self.input.accumulate(source),
                    Some(kind) => self.params.accumulate(kind, source),
                }
            }

            if let Some(entry) = self.slots[index].entry.as_mut() {
                entry
                    .node
                    .process(&self.input, &self.params, &mut self.outputs[index], &ctx);
            }
        }

        self.frames += RENDER_QUANTUM as u64;
    }

    fn refresh_order(&mut self) {
        if !self.dirty {
            return;
        }

        let count = self.slots.len();
        for feeds in &mut self.feeds {
            feeds.clear();
        }
        let mut indegree = vec![0usize; count];

        for (index, slot) in self.slots.iter().enumerate() {
            let Some(entry) = &slot.entry else { continue };
            for edge in &entry.edges {
                let (target, param) = match *edge {
                    Edge::Input(target) => (target, None),
                    Edge::Param(target, kind) => (target, Some(kind)),
                };
                let target = target.index as usize;
                self.feeds[target].push(Feed { from: index, param });
                indegree[target] += 1;
            }
        }

        self.order.clear();
        let mut ready: Vec<usize> = (0..count)
            .filter(|&i| self.slots[i].entry.is_some() && indegree[i] == 0)
            .collect();
        while let Some(index) = ready.pop() {
            self.order.push(index);
            if let Some(entry) = &self.slots[index].entry {
                for edge in &entry.edges {
                    let target = edge.target().index as usize;
                    indegree[target] -= 1;
                    if indegree[target] == 0 {
                        ready.push(target);
                    }
                }
            }
        }

        self.dirty = false;
    }

    fn add_edge(&mut self, from: NodeId, edge: Edge) -> Result<(), GraphError> {
        let to = edge.target();
        self.entry(to)?;
        self.entry(from)?;
        if from == to || self.reaches(to, from) {
            return Err(GraphError::Cycle { from, to });
        }

        let entry = self.entry_mut(from)?;
        if !entry.edges.contains(&edge) {
            entry.edges.push(edge);
            self.dirty = true;
        }
        Ok(())
    }

    /// Depth-first search along edges from `start` looking for `goal`.
    fn reaches(&self, start: NodeId, goal: NodeId) -> bool {
        let mut visited = vec![false; self.slots.len()];
        let mut stack = vec![start];

        while let Some(id) = stack.pop() {
            if id == goal {
                return true;
            }
            let index = id.index as usize;
            if visited[index] {
                continue;
            }
            visited[index] = true;
            if let Ok(entry) = self.entry(id) {
                stack.extend(entry.edges.iter().map(Edge::target));
            }
        }
        false
    }

    fn entry(&self, id: NodeId) -> Result<&Entry, GraphError> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(GraphError::UnknownNode(id))
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut Entry, GraphError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
            .ok_or(GraphError::UnknownNode(id))
    }
}
