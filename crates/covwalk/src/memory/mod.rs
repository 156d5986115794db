//! In-Memory Coverage Database
//!
//! A reference [`CoverageDatabase`] for exercising visitors without a vendor
//! database. Build one with [`MemoryDatabase::builder`] or from a YAML/JSON
//! [`Fixture`].
//!
//! Every handle and cursor it hands out is tracked in a ledger, so tests can
//! assert that a walk released everything it acquired:
//!
//! ```rust,ignore
//! let db = Fixture::from_yaml_str(yaml)?.build()?;
//! let walker = Walker::load_merged(db.load_design()?, &mut visitor, config)?;
//! walker.execute(&mut visitor, None)?;
//! drop(walker);
//! assert_eq!(db.stats().live, 0);
//! ```
//!
//! Faults can be injected per accessor family to drive error paths.

mod builder;
mod fixture;

pub use builder::MemoryDatabaseBuilder;
pub use fixture::{
    AssertionFixture, CovergroupFixture, DefinitionFixture, Fixture, InstanceFixture,
    ObjectFixture, ObjectTypeSpec, VariantFixture, VariantInstanceFixture,
};

use crate::database::{
    CoverageDatabase, DatabaseError, DbResult, EntityKind, IntProperty, RawHandle, Relation,
    StrProperty,
};
use crate::handle::Handle;
use crate::result::{WalkError, WalkResult};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Index of a node in a [`MemoryDatabase`]
pub type NodeId = usize;

/// One database entity
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) type_code: i64,
    pub(crate) name: Option<String>,
    pub(crate) full_name: Option<String>,
    pub(crate) ints: HashMap<IntProperty, i64>,
    pub(crate) strs: HashMap<StrProperty, String>,
    pub(crate) annotations: HashMap<String, String>,
}

/// Link table key: source node, qualifying metric, relation
pub(crate) type LinkKey = (NodeId, Option<NodeId>, Relation);

/// Handle ledger counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleStats {
    /// Handles and cursors handed out
    pub acquired: usize,
    /// Successful releases
    pub released: usize,
    /// Successful promotions
    pub promoted: usize,
    /// Currently outstanding handles and cursors
    pub live: usize,
    /// Releases of unknown or already released ids
    pub invalid_releases: usize,
}

/// Accessor families that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultSite {
    /// `iterate` and `qualified_iterate`
    Iterate,
    /// `scan`
    Scan,
    /// `int_property`, `str_property` and `annotation`
    Property,
    /// `related` and `qualified_handle`
    Related,
}

/// When an injected fault fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Always,
    /// Zero-based call index at the fault site
    Nth(usize),
}

#[derive(Debug, Clone)]
struct Fault {
    site: FaultSite,
    trigger: Trigger,
    error: DatabaseError,
}

#[derive(Debug)]
enum Entry {
    Node(NodeId),
    Cursor { items: Vec<NodeId>, pos: usize },
}

#[derive(Debug)]
struct Slot {
    entry: Entry,
    persistent: bool,
}

#[derive(Debug, Default)]
struct Ledger {
    next: u64,
    slots: HashMap<u64, Slot>,
    stats: HandleStats,
}

impl Ledger {
    fn acquire(&mut self, entry: Entry) -> RawHandle {
        self.next += 1;
        self.slots.insert(
            self.next,
            Slot {
                entry,
                persistent: false,
            },
        );
        self.stats.acquired += 1;
        self.stats.live = self.slots.len();
        RawHandle::new(self.next)
    }

    fn retire(&mut self, handle: RawHandle) -> DbResult<Slot> {
        match self.slots.remove(&handle.as_u64()) {
            Some(slot) => {
                self.stats.released += 1;
                self.stats.live = self.slots.len();
                Ok(slot)
            }
            None => {
                self.stats.invalid_releases += 1;
                Err(DatabaseError::invalid_handle(handle))
            }
        }
    }
}

/// In-memory coverage database with a handle ledger
#[derive(Debug)]
pub struct MemoryDatabase {
    design_name: String,
    design: NodeId,
    test: NodeId,
    test_names: Vec<String>,
    nodes: Vec<Node>,
    links: HashMap<LinkKey, Vec<NodeId>>,
    ledger: RefCell<Ledger>,
    faults: RefCell<Vec<Fault>>,
    calls: RefCell<HashMap<FaultSite, usize>>,
    merged: RefCell<Vec<String>>,
    display_errors: Cell<bool>,
}

impl MemoryDatabase {
    /// Start building a database whose design loads from `design_name`
    #[must_use]
    pub fn builder(design_name: impl Into<String>) -> MemoryDatabaseBuilder {
        MemoryDatabaseBuilder::new(design_name)
    }

    pub(crate) fn from_parts(
        design_name: String,
        design: NodeId,
        test: NodeId,
        test_names: Vec<String>,
        nodes: Vec<Node>,
        links: HashMap<LinkKey, Vec<NodeId>>,
    ) -> Self {
        Self {
            design_name,
            design,
            test,
            test_names,
            nodes,
            links,
            ledger: RefCell::new(Ledger::default()),
            faults: RefCell::new(Vec::new()),
            calls: RefCell::new(HashMap::new()),
            merged: RefCell::new(Vec::new()),
            display_errors: Cell::new(false),
        }
    }

    /// Locator the design loads from
    #[must_use]
    pub fn design_name(&self) -> &str {
        &self.design_name
    }

    /// Test names recorded in the design
    #[must_use]
    pub fn test_names(&self) -> &[String] {
        &self.test_names
    }

    /// Load the design handle
    pub fn load_design(&self) -> WalkResult<Handle<'_, Self>> {
        Handle::load(self, EntityKind::Design, None, &self.design_name)?
            .ok_or_else(|| WalkError::load_failed(EntityKind::Design, self.design_name.clone()))
    }

    /// Load one named test
    pub fn load_test<'db>(
        &'db self,
        design: &Handle<'db, Self>,
        name: &str,
    ) -> WalkResult<Handle<'db, Self>> {
        Handle::load(self, EntityKind::Test, Some(design), name)?
            .ok_or_else(|| WalkError::load_failed(EntityKind::Test, name))
    }

    /// Ledger counters
    #[must_use]
    pub fn stats(&self) -> HandleStats {
        self.ledger.borrow().stats
    }

    /// Number of outstanding persistent handles
    #[must_use]
    pub fn live_persistent(&self) -> usize {
        self.ledger
            .borrow()
            .slots
            .values()
            .filter(|slot| slot.persistent)
            .count()
    }

    /// Test names loaded or merged so far, in order
    #[must_use]
    pub fn merged_tests(&self) -> Vec<String> {
        self.merged.borrow().clone()
    }

    /// Last value passed to `set_display_errors`
    #[must_use]
    pub fn displays_errors(&self) -> bool {
        self.display_errors.get()
    }

    /// Fail every call at `site` with `error`
    pub fn inject(&self, site: FaultSite, error: DatabaseError) {
        self.faults.borrow_mut().push(Fault {
            site,
            trigger: Trigger::Always,
            error,
        });
    }

    /// Fail only the `n`th (zero-based) call at `site`
    pub fn inject_nth(&self, site: FaultSite, n: usize, error: DatabaseError) {
        self.faults.borrow_mut().push(Fault {
            site,
            trigger: Trigger::Nth(n),
            error,
        });
    }

    /// Remove every injected fault and reset call counters
    pub fn clear_faults(&self) {
        self.faults.borrow_mut().clear();
        self.calls.borrow_mut().clear();
    }

    fn fault(&self, site: FaultSite) -> DbResult<()> {
        let index = {
            let mut calls = self.calls.borrow_mut();
            let count = calls.entry(site).or_insert(0);
            let index = *count;
            *count += 1;
            index
        };
        let faults = self.faults.borrow();
        let hit = faults.iter().find(|fault| {
            fault.site == site
                && match fault.trigger {
                    Trigger::Always => true,
                    Trigger::Nth(n) => n == index,
                }
        });
        match hit {
            Some(fault) => Err(fault.error.clone()),
            None => Ok(()),
        }
    }

    fn node_of(&self, handle: RawHandle) -> DbResult<NodeId> {
        match self.ledger.borrow().slots.get(&handle.as_u64()) {
            Some(Slot {
                entry: Entry::Node(node),
                ..
            }) => Ok(*node),
            _ => Err(DatabaseError::invalid_handle(handle)),
        }
    }

    fn node(&self, id: NodeId) -> DbResult<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| DatabaseError::invalid_handle(RawHandle::new(id as u64)))
    }

    fn acquire_node(&self, node: NodeId) -> RawHandle {
        self.ledger.borrow_mut().acquire(Entry::Node(node))
    }

    fn open_cursor(&self, key: LinkKey) -> RawHandle {
        let items = self.links.get(&key).cloned().unwrap_or_default();
        self.ledger
            .borrow_mut()
            .acquire(Entry::Cursor { items, pos: 0 })
    }

    fn first_link(&self, key: LinkKey) -> Option<RawHandle> {
        self.links
            .get(&key)
            .and_then(|targets| targets.first())
            .map(|&node| self.acquire_node(node))
    }
}

impl CoverageDatabase for MemoryDatabase {
    fn load(
        &self,
        kind: EntityKind,
        parent: Option<RawHandle>,
        locator: &str,
    ) -> DbResult<Option<RawHandle>> {
        match kind {
            EntityKind::Design => {
                Ok((locator == self.design_name).then(|| self.acquire_node(self.design)))
            }
            EntityKind::Test => {
                if let Some(parent) = parent {
                    if self.node_of(parent)? != self.design {
                        return Err(DatabaseError::invalid_relation());
                    }
                }
                if self.test_names.iter().any(|name| name == locator) {
                    self.merged.borrow_mut().push(locator.to_string());
                    Ok(Some(self.acquire_node(self.test)))
                } else {
                    Ok(None)
                }
            }
        }
    }

    fn load_merge(&self, test: RawHandle, locator: &str) -> DbResult<Option<RawHandle>> {
        if self.node_of(test)? != self.test {
            return Err(DatabaseError::invalid_relation());
        }
        if !self.test_names.iter().any(|name| name == locator) {
            return Ok(None);
        }
        let mut ledger = self.ledger.borrow_mut();
        let persistent = ledger.retire(test)?.persistent;
        let merged = ledger.acquire(Entry::Node(self.test));
        if let Some(slot) = ledger.slots.get_mut(&merged.as_u64()) {
            slot.persistent = persistent;
        }
        drop(ledger);
        self.merged.borrow_mut().push(locator.to_string());
        Ok(Some(merged))
    }

    fn iterate(&self, handle: RawHandle, relation: Relation) -> DbResult<Option<RawHandle>> {
        self.fault(FaultSite::Iterate)?;
        let node = self.node_of(handle)?;
        Ok(Some(self.open_cursor((node, None, relation))))
    }

    fn qualified_iterate(
        &self,
        handle: RawHandle,
        metric: RawHandle,
        relation: Relation,
    ) -> DbResult<Option<RawHandle>> {
        self.fault(FaultSite::Iterate)?;
        let node = self.node_of(handle)?;
        let metric = self.node_of(metric)?;
        Ok(Some(self.open_cursor((node, Some(metric), relation))))
    }

    fn scan(&self, cursor: RawHandle) -> DbResult<Option<RawHandle>> {
        self.fault(FaultSite::Scan)?;
        let mut ledger = self.ledger.borrow_mut();
        let next = match ledger.slots.get_mut(&cursor.as_u64()) {
            Some(Slot {
                entry: Entry::Cursor { items, pos },
                ..
            }) => {
                let next = items.get(*pos).copied();
                if next.is_some() {
                    *pos += 1;
                }
                next
            }
            _ => return Err(DatabaseError::invalid_handle(cursor)),
        };
        Ok(next.map(|node| ledger.acquire(Entry::Node(node))))
    }

    fn qualified_handle(
        &self,
        handle: RawHandle,
        metric: RawHandle,
        relation: Relation,
    ) -> DbResult<Option<RawHandle>> {
        self.fault(FaultSite::Related)?;
        let node = self.node_of(handle)?;
        let metric = self.node_of(metric)?;
        Ok(self.first_link((node, Some(metric), relation)))
    }

    fn int_property(
        &self,
        handle: RawHandle,
        _context: Option<RawHandle>,
        _test: Option<RawHandle>,
        property: IntProperty,
    ) -> DbResult<i64> {
        self.fault(FaultSite::Property)?;
        let node = self.node(self.node_of(handle)?)?;
        if property == IntProperty::Type {
            return Ok(node.type_code);
        }
        node.ints
            .get(&property)
            .copied()
            .ok_or_else(DatabaseError::invalid_property)
    }

    fn str_property(&self, handle: RawHandle, property: StrProperty) -> DbResult<Option<String>> {
        self.fault(FaultSite::Property)?;
        let node = self.node(self.node_of(handle)?)?;
        Ok(match property {
            StrProperty::Name => node.name.clone(),
            StrProperty::FullName => node.full_name.clone().or_else(|| node.name.clone()),
            other => node.strs.get(&other).cloned(),
        })
    }

    fn related(&self, handle: RawHandle, relation: Relation) -> DbResult<Option<RawHandle>> {
        self.fault(FaultSite::Related)?;
        let node = self.node_of(handle)?;
        Ok(self.first_link((node, None, relation)))
    }

    fn annotation(&self, handle: RawHandle, key: &str) -> DbResult<Option<String>> {
        self.fault(FaultSite::Property)?;
        let node = self.node(self.node_of(handle)?)?;
        Ok(node.annotations.get(key).cloned())
    }

    fn promote(&self, handle: RawHandle) -> DbResult<RawHandle> {
        let mut guard = self.ledger.borrow_mut();
        let ledger = &mut *guard;
        match ledger.slots.get_mut(&handle.as_u64()) {
            Some(slot) if matches!(slot.entry, Entry::Node(_)) => {
                slot.persistent = true;
                ledger.stats.promoted += 1;
                Ok(handle)
            }
            _ => Err(DatabaseError::invalid_handle(handle)),
        }
    }

    fn release(&self, handle: RawHandle) -> DbResult<()> {
        self.ledger.borrow_mut().retire(handle).map(|_| ())
    }

    fn set_display_errors(&self, enabled: bool) {
        self.display_errors.set(enabled);
    }
}
