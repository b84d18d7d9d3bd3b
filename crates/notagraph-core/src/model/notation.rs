use std::collections::{HashMap, HashSet};

use crate::errors::{NotationError, Result};

use super::change::{ChangeKind, ChangeRecord, Direction};
use super::element::{Containment, ElementId, ElementKind, NotationElement};
use super::value::{keys, Bounds, Dimension, FeatureKey, FeatureValue, Point};

/// Containment graph of notation elements
///
/// Elements live in an arena keyed by id. Ownership is expressed twice: as a
/// `Contained` value (or list entry) on the owner, and as the `container`
/// back-reference on the child. Every mutation keeps both in step, and an
/// element has at most one owner at any instant.
///
/// Elements released from their owner stay in the arena, free, so that
/// recorded changes can re-attach them on undo; the history discards them
/// once no held command can reach them. Only elements reachable from the
/// root are part of the visible model (see [`NotationModel::snapshot`]), and
/// a `Reference` on the visible model always targets the visible model.
#[derive(Debug, Clone)]
pub struct NotationModel {
    pub(crate) root: ElementId,
    pub(crate) elements: HashMap<ElementId, NotationElement>,
}

impl Default for NotationModel {
    fn default() -> Self {
        Self::new()
    }
}

impl NotationModel {
    /// Create a model holding only an empty diagram root
    pub fn new() -> Self {
        let root = ElementId::generate();
        let mut elements = HashMap::new();
        elements.insert(
            root.clone(),
            NotationElement::new(root.clone(), ElementKind::Diagram),
        );
        Self { root, elements }
    }

    // ===== Queries =====

    pub fn root(&self) -> &ElementId {
        &self.root
    }

    pub fn element(&self, id: &ElementId) -> Option<&NotationElement> {
        self.elements.get(id)
    }

    /// Number of elements in the arena, free ones included
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn get_feature(&self, id: &ElementId, key: &str) -> Option<&FeatureValue> {
        self.elements.get(id).and_then(|e| e.feature(key))
    }

    pub fn container_of(&self, id: &ElementId) -> Option<&Containment> {
        self.elements.get(id).and_then(NotationElement::container)
    }

    pub fn children(&self, id: &ElementId, key: &str) -> &[ElementId] {
        self.elements.get(id).map(|e| e.list(key)).unwrap_or(&[])
    }

    pub fn position_of(&self, id: &ElementId) -> Option<Point> {
        let point = self.get_feature(id, keys::POSITION)?.as_contained()?;
        Some(Point::new(
            self.get_feature(point, keys::X)?.as_number()?,
            self.get_feature(point, keys::Y)?.as_number()?,
        ))
    }

    pub fn size_of(&self, id: &ElementId) -> Option<Dimension> {
        let dimension = self.get_feature(id, keys::SIZE)?.as_contained()?;
        Some(Dimension::new(
            self.get_feature(dimension, keys::WIDTH)?.as_number()?,
            self.get_feature(dimension, keys::HEIGHT)?.as_number()?,
        ))
    }

    pub fn bounds(&self, id: &ElementId) -> Option<Bounds> {
        Some(Bounds {
            position: self.position_of(id)?,
            size: self.size_of(id)?,
        })
    }

    /// Strict descendants in depth-first pre-order
    pub fn descendants(&self, id: &ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self
            .elements
            .get(id)
            .map(NotationElement::contained_ids)
            .unwrap_or_default();
        stack.reverse();
        while let Some(next) = stack.pop() {
            if let Some(element) = self.elements.get(&next) {
                let mut owned = element.contained_ids();
                owned.reverse();
                stack.extend(owned);
            }
            out.push(next);
        }
        out
    }

    /// Whether the element is reachable from the root
    pub fn is_attached(&self, id: &ElementId) -> bool {
        let mut current = id;
        for _ in 0..=self.elements.len() {
            if current == &self.root {
                return true;
            }
            match self.container_of(current) {
                Some(containment) => current = &containment.owner,
                None => return false,
            }
        }
        false
    }

    /// Number of owner slots holding the element; never more than one
    pub fn owner_count(&self, id: &ElementId) -> usize {
        self.elements
            .values()
            .map(|e| e.contained_ids().iter().filter(|c| *c == id).count())
            .sum()
    }

    // ===== Creation =====

    /// Create a free element of the given kind
    pub fn create_element(&mut self, kind: ElementKind) -> ElementId {
        let id = ElementId::generate();
        self.elements
            .insert(id.clone(), NotationElement::new(id.clone(), kind));
        id
    }

    /// Create a free `Point` value
    ///
    /// # Errors
    ///
    /// Returns `NonFiniteNumber` when a coordinate is NaN or infinite.
    pub fn create_point(&mut self, x: f64, y: f64) -> Result<ElementId> {
        self.create_value(ElementKind::Point, [(keys::X, x), (keys::Y, y)])
    }

    /// Create a free `Dimension` value
    ///
    /// # Errors
    ///
    /// Returns `NonFiniteNumber` when a component is NaN or infinite.
    pub fn create_dimension(&mut self, width: f64, height: f64) -> Result<ElementId> {
        self.create_value(
            ElementKind::Dimension,
            [(keys::WIDTH, width), (keys::HEIGHT, height)],
        )
    }

    fn create_value(&mut self, kind: ElementKind, fields: [(&str, f64); 2]) -> Result<ElementId> {
        let id = ElementId::generate();
        let mut element = NotationElement::new(id.clone(), kind);
        for (key, value) in fields {
            if !value.is_finite() {
                return Err(NotationError::NonFiniteNumber {
                    element_id: id.to_string(),
                    feature: key.to_string(),
                });
            }
            element
                .features
                .insert(FeatureKey::from(key), FeatureValue::Number(value));
        }
        self.elements.insert(id.clone(), element);
        Ok(id)
    }

    /// Build a free bounded element that already owns its position and size
    ///
    /// Nothing is recorded: the element is not part of the visible model
    /// until it is attached.
    ///
    /// # Errors
    ///
    /// Returns `MissingCapability` for kinds without bounds and
    /// `NonFiniteNumber` for NaN or infinite geometry.
    pub fn build_node(
        &mut self,
        kind: ElementKind,
        position: Point,
        size: Dimension,
    ) -> Result<ElementId> {
        let id = ElementId::generate();
        if !kind.has_bounds() {
            return Err(NotationError::MissingCapability {
                element_id: id.to_string(),
                capability: "bounds",
            });
        }
        let point = self.create_point(position.x, position.y)?;
        let dimension = match self.create_dimension(size.width, size.height) {
            Ok(dimension) => dimension,
            Err(err) => {
                self.elements.remove(&point);
                return Err(err);
            }
        };

        let mut node = NotationElement::new(id.clone(), kind);
        node.features.insert(
            FeatureKey::from(keys::POSITION),
            FeatureValue::Contained(point.clone()),
        );
        node.features.insert(
            FeatureKey::from(keys::SIZE),
            FeatureValue::Contained(dimension.clone()),
        );
        self.elements.insert(id.clone(), node);
        self.set_container(&point, Some(containment(&id, keys::POSITION)))?;
        self.set_container(&dimension, Some(containment(&id, keys::SIZE)))?;
        Ok(id)
    }

    /// Build a node and append it to `parent.children`
    ///
    /// Returns the new id together with the attach records.
    ///
    /// # Errors
    ///
    /// Fails like [`NotationModel::build_node`] and
    /// [`NotationModel::add_child`]; on failure nothing is left behind.
    pub fn create_node(
        &mut self,
        parent: &ElementId,
        kind: ElementKind,
        position: Point,
        size: Dimension,
    ) -> Result<(ElementId, Vec<ChangeRecord>)> {
        self.require(parent)?;
        let id = self.build_node(kind, position, size)?;
        match self.add_child(parent, keys::CHILDREN, &id, None) {
            Ok(records) => Ok((id, records)),
            Err(err) => {
                self.discard(&id)?;
                Err(err)
            }
        }
    }

    /// Shape convenience for [`NotationModel::create_node`]
    ///
    /// # Errors
    ///
    /// See [`NotationModel::create_node`].
    pub fn create_shape(
        &mut self,
        parent: &ElementId,
        position: (f64, f64),
        size: (f64, f64),
    ) -> Result<(ElementId, Vec<ChangeRecord>)> {
        self.create_node(
            parent,
            ElementKind::Shape,
            Point::new(position.0, position.1),
            Dimension::new(size.0, size.1),
        )
    }

    /// Drop a free element and everything it contains from the arena
    ///
    /// # Errors
    ///
    /// Returns `CannotRemoveRoot` for the root and `DualOwnership` when the
    /// element is still attached to an owner.
    pub fn discard(&mut self, id: &ElementId) -> Result<()> {
        if id == &self.root {
            return Err(NotationError::CannotRemoveRoot {
                element_id: id.to_string(),
            });
        }
        if let Some(containment) = self.require(id)?.container() {
            return Err(NotationError::DualOwnership {
                element_id: id.to_string(),
                owner: containment.owner.to_string(),
                feature: containment.feature.to_string(),
            });
        }
        for descendant in self.descendants(id) {
            self.elements.remove(&descendant);
        }
        self.elements.remove(id);
        Ok(())
    }

    // ===== Mutation =====

    /// Assign a single-valued feature, emitting a touch when unchanged
    ///
    /// `None` unsets the feature. A `Contained` value owned elsewhere is
    /// detached from its old owner first; the records come out in causal
    /// order: old-owner detach, then the new-owner `Set`.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound`, `FeatureKindMismatch`, `NonFiniteNumber`,
    /// `RootContainment` or `OwnershipCycle`. Validation happens before any
    /// write, so the model is unchanged on error.
    pub fn set_feature(
        &mut self,
        element: &ElementId,
        key: &str,
        new_value: Option<FeatureValue>,
    ) -> Result<Vec<ChangeRecord>> {
        self.assign(element, key, new_value, true)
    }

    /// Like [`NotationModel::set_feature`] but silent when unchanged
    ///
    /// # Errors
    ///
    /// See [`NotationModel::set_feature`].
    pub fn update_feature(
        &mut self,
        element: &ElementId,
        key: &str,
        new_value: Option<FeatureValue>,
    ) -> Result<Vec<ChangeRecord>> {
        self.assign(element, key, new_value, false)
    }

    fn assign(
        &mut self,
        element: &ElementId,
        key: &str,
        new_value: Option<FeatureValue>,
        touch: bool,
    ) -> Result<Vec<ChangeRecord>> {
        let target = self.require(element)?;
        if target.lists.contains_key(key) {
            return Err(mismatch(element, key, "single-valued"));
        }
        let current = target.features.get(key).cloned();

        if current == new_value {
            if touch {
                return Ok(vec![ChangeRecord::set(
                    element.clone(),
                    FeatureKey::from(key),
                    current.clone(),
                    current,
                )]);
            }
            return Ok(Vec::new());
        }

        self.validate_value(element, key, new_value.as_ref())?;
        let attached = self.is_attached(element);
        if let Some(FeatureValue::Reference(target)) = &new_value {
            if attached && !self.is_attached(target) {
                return Err(NotationError::DetachedReference {
                    element_id: element.to_string(),
                    feature: key.to_string(),
                    target: target.to_string(),
                });
            }
        }

        let mut records = Vec::new();
        if let Some(FeatureValue::Contained(child)) = &new_value {
            records.extend(self.detach(child)?);
        }
        if let (true, Some(FeatureValue::Contained(released))) = (attached, &current) {
            let subtree = self.subtree(released);
            match self.unset_references_into(&subtree) {
                Ok(unset) => records.extend(unset),
                Err(err) => {
                    self.revert(&records);
                    return Err(err);
                }
            }
        }
        self.write_slot(element, key, new_value.clone())?;
        records.push(ChangeRecord::set(
            element.clone(),
            FeatureKey::from(key),
            current,
            new_value,
        ));
        Ok(records)
    }

    /// Insert `child` into the list feature `key` of `owner`
    ///
    /// `index` defaults to the end of the list. A child already in that list
    /// is left alone and no records are produced.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound`, `FeatureKindMismatch`, `IndexOutOfBounds`,
    /// `RootContainment` or `OwnershipCycle`, with the model unchanged.
    pub fn add_child(
        &mut self,
        owner: &ElementId,
        key: &str,
        child: &ElementId,
        index: Option<usize>,
    ) -> Result<Vec<ChangeRecord>> {
        let target = self.require(owner)?;
        if target.features.contains_key(key) {
            return Err(mismatch(owner, key, "list"));
        }
        let len = target.list(key).len();
        self.require(child)?;
        if let Some(containment) = self.container_of(child) {
            if &containment.owner == owner && containment.feature == key {
                return Ok(Vec::new());
            }
        }
        self.check_attachable(owner, child)?;
        let index = index.unwrap_or(len);
        if index > len {
            return Err(NotationError::IndexOutOfBounds {
                element_id: owner.to_string(),
                feature: key.to_string(),
                index,
                len,
            });
        }

        let mut records: Vec<ChangeRecord> = self.detach(child)?.into_iter().collect();
        self.insert_into_list(owner, key, child, index)?;
        records.push(ChangeRecord::add(
            owner.clone(),
            FeatureKey::from(key),
            child.clone(),
            index,
        ));
        Ok(records)
    }

    /// Detach an element and, bottom-up, everything it contains
    ///
    /// References elsewhere on the visible model that point into the removed
    /// subtree are unset first, in the same batch, so undo restores them.
    ///
    /// # Errors
    ///
    /// Returns `CannotRemoveRoot` or `ElementNotFound`.
    pub fn remove_element(&mut self, id: &ElementId) -> Result<Vec<ChangeRecord>> {
        if id == &self.root {
            return Err(NotationError::CannotRemoveRoot {
                element_id: id.to_string(),
            });
        }
        self.require(id)?;

        let mut order = self.post_order(id);
        order.push(id.clone());

        let removed: HashSet<ElementId> = order.iter().cloned().collect();
        let mut records = self.unset_references_into(&removed)?;
        for next in &order {
            match self.detach(next) {
                Ok(detached) => records.extend(detached),
                Err(err) => {
                    self.revert(&records);
                    return Err(err);
                }
            }
        }
        Ok(records)
    }

    fn subtree(&self, id: &ElementId) -> HashSet<ElementId> {
        let mut ids: HashSet<ElementId> = self.descendants(id).into_iter().collect();
        ids.insert(id.clone());
        ids
    }

    /// Unset every reference on the visible model that targets `released`
    ///
    /// Holders inside `released` are skipped; they leave the visible model
    /// together with their targets.
    fn unset_references_into(
        &mut self,
        released: &HashSet<ElementId>,
    ) -> Result<Vec<ChangeRecord>> {
        let mut holders = vec![self.root.clone()];
        holders.extend(self.descendants(&self.root));

        let mut dangling: Vec<(ElementId, FeatureKey, FeatureValue)> = Vec::new();
        for id in holders.iter().filter(|id| !released.contains(*id)) {
            let Some(holder) = self.elements.get(id) else {
                continue;
            };
            for (key, value) in &holder.features {
                if let FeatureValue::Reference(target) = value {
                    if released.contains(target) {
                        dangling.push((id.clone(), key.clone(), value.clone()));
                    }
                }
            }
        }

        let mut records = Vec::with_capacity(dangling.len());
        for (holder, key, value) in dangling {
            self.write_slot(&holder, key.as_str(), None)?;
            records.push(ChangeRecord::set(holder, key, Some(value), None));
        }
        Ok(records)
    }

    fn post_order(&self, id: &ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        if let Some(element) = self.elements.get(id) {
            for child in element.contained_ids() {
                out.extend(self.post_order(&child));
                out.push(child);
            }
        }
        out
    }

    // ===== Replay =====

    /// Replay a single recorded change
    ///
    /// The record must match the current model exactly: the slot still holds
    /// the record's old value and an incoming contained child is free.
    ///
    /// # Errors
    ///
    /// Returns `HistoryOutOfSync` when the model diverged from the record,
    /// `DualOwnership` when the incoming child is owned elsewhere.
    pub fn apply_change(&mut self, record: &ChangeRecord, direction: Direction) -> Result<()> {
        let record = match direction {
            Direction::Forward => record.clone(),
            Direction::Reverse => record.inverted(),
        };
        let element = &record.element;
        let key = record.feature.as_str();

        match record.kind {
            ChangeKind::Set => {
                let target = self.require(element)?;
                if target.lists.contains_key(key) {
                    return Err(mismatch(element, key, "single-valued"));
                }
                if target.features.get(key) != record.old_value.as_ref() {
                    return Err(out_of_sync(&record, "current value differs from recorded old value"));
                }
                if record.is_touch() {
                    return Ok(());
                }
                self.validate_value(element, key, record.new_value.as_ref())?;
                if let Some(FeatureValue::Contained(child)) = &record.new_value {
                    self.require_free(child)?;
                }
                self.write_slot(element, key, record.new_value.clone())?;
            }
            ChangeKind::Add => {
                let (child, index) = list_operands(&record, record.new_value.as_ref())?;
                let target = self.require(element)?;
                if target.features.contains_key(key) {
                    return Err(mismatch(element, key, "list"));
                }
                if index > target.list(key).len() {
                    return Err(out_of_sync(&record, "insert index past end of list"));
                }
                self.require(child)?;
                self.check_attachable(element, child)?;
                self.require_free(child)?;
                self.insert_into_list(element, key, child, index)?;
            }
            ChangeKind::Remove => {
                let (child, index) = list_operands(&record, record.old_value.as_ref())?;
                if self.require(element)?.list(key).get(index) != Some(child) {
                    return Err(out_of_sync(&record, "list entry differs from recorded child"));
                }
                if let Some(list) = self.element_mut(element)?.lists.get_mut(key) {
                    list.remove(index);
                }
                self.set_container(child, None)?;
            }
        }
        Ok(())
    }

    /// Replay a batch of records, all or nothing
    ///
    /// `Forward` applies the records in order; `Reverse` reverts them from
    /// last to first. If any step fails the steps already taken are rolled
    /// back before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing step.
    pub fn apply_batch(&mut self, records: &[ChangeRecord], direction: Direction) -> Result<()> {
        let steps: Vec<&ChangeRecord> = match direction {
            Direction::Forward => records.iter().collect(),
            Direction::Reverse => records.iter().rev().collect(),
        };
        let undo_direction = match direction {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        };
        for (done, record) in steps.iter().enumerate() {
            if let Err(err) = self.apply_change(record, direction) {
                for applied in steps[..done].iter().rev() {
                    if let Err(rollback) = self.apply_change(applied, undo_direction) {
                        tracing::error!(error = %rollback, "rollback of partially applied batch failed");
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Best-effort revert of records produced by this model moments ago
    pub(crate) fn revert(&mut self, records: &[ChangeRecord]) {
        if let Err(err) = self.apply_batch(records, Direction::Reverse) {
            tracing::error!(error = %err, "failed to revert partially applied edit");
        }
    }

    // ===== Internals =====

    fn require(&self, id: &ElementId) -> Result<&NotationElement> {
        self.elements
            .get(id)
            .ok_or_else(|| NotationError::ElementNotFound {
                element_id: id.to_string(),
            })
    }

    fn element_mut(&mut self, id: &ElementId) -> Result<&mut NotationElement> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| NotationError::ElementNotFound {
                element_id: id.to_string(),
            })
    }

    fn require_free(&self, child: &ElementId) -> Result<()> {
        match self.container_of(child) {
            Some(containment) => Err(NotationError::DualOwnership {
                element_id: child.to_string(),
                owner: containment.owner.to_string(),
                feature: containment.feature.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn validate_value(
        &self,
        element: &ElementId,
        key: &str,
        value: Option<&FeatureValue>,
    ) -> Result<()> {
        match value {
            Some(FeatureValue::Number(n)) if !n.is_finite() => {
                Err(NotationError::NonFiniteNumber {
                    element_id: element.to_string(),
                    feature: key.to_string(),
                })
            }
            Some(FeatureValue::Contained(child)) => {
                self.require(child)?;
                self.check_attachable(element, child)
            }
            Some(FeatureValue::Reference(target)) => self.require(target).map(|_| ()),
            _ => Ok(()),
        }
    }

    /// Reject attaching the root, or an element under itself or a descendant
    fn check_attachable(&self, owner: &ElementId, child: &ElementId) -> Result<()> {
        if child == &self.root {
            return Err(NotationError::RootContainment {
                element_id: child.to_string(),
            });
        }
        let mut current = Some(owner);
        let mut steps = 0;
        while let Some(id) = current {
            if id == child {
                return Err(NotationError::OwnershipCycle {
                    element_id: child.to_string(),
                    owner: owner.to_string(),
                });
            }
            steps += 1;
            if steps > self.elements.len() {
                return Err(NotationError::Internal {
                    message: format!("container chain of {} does not terminate", owner),
                });
            }
            current = self.container_of(id).map(|c| &c.owner);
        }
        Ok(())
    }

    /// Release an element from its current owner slot
    fn detach(&mut self, child: &ElementId) -> Result<Option<ChangeRecord>> {
        let Some(containment) = self.container_of(child).cloned() else {
            return Ok(None);
        };
        let owner = self.element_mut(&containment.owner)?;
        let key = containment.feature.as_str();

        let record = if let Some(list) = owner.lists.get_mut(key) {
            let index = list
                .iter()
                .position(|c| c == child)
                .ok_or_else(|| broken_back_reference(child, &containment))?;
            list.remove(index);
            ChangeRecord::remove(
                containment.owner.clone(),
                containment.feature.clone(),
                child.clone(),
                index,
            )
        } else {
            match owner.features.get(key) {
                Some(FeatureValue::Contained(held)) if held == child => {
                    owner.features.remove(key);
                }
                _ => return Err(broken_back_reference(child, &containment)),
            }
            ChangeRecord::set(
                containment.owner.clone(),
                containment.feature.clone(),
                Some(FeatureValue::Contained(child.clone())),
                None,
            )
        };
        self.set_container(child, None)?;
        Ok(Some(record))
    }

    /// Overwrite a single-valued slot, keeping back-references in step
    fn write_slot(
        &mut self,
        element: &ElementId,
        key: &str,
        value: Option<FeatureValue>,
    ) -> Result<()> {
        let attached = value.as_ref().and_then(FeatureValue::as_contained).cloned();
        let target = self.element_mut(element)?;
        let previous = match value {
            Some(value) => target.features.insert(FeatureKey::from(key), value),
            None => target.features.remove(key),
        };
        if let Some(FeatureValue::Contained(released)) = previous {
            self.set_container(&released, None)?;
        }
        if let Some(child) = attached {
            self.set_container(&child, Some(containment(element, key)))?;
        }
        Ok(())
    }

    fn insert_into_list(
        &mut self,
        owner: &ElementId,
        key: &str,
        child: &ElementId,
        index: usize,
    ) -> Result<()> {
        let list = self
            .element_mut(owner)?
            .lists
            .entry(FeatureKey::from(key))
            .or_default();
        list.insert(index, child.clone());
        self.set_container(child, Some(containment(owner, key)))
    }

    fn set_container(&mut self, id: &ElementId, container: Option<Containment>) -> Result<()> {
        self.element_mut(id)?.container = container;
        Ok(())
    }
}

fn containment(owner: &ElementId, key: &str) -> Containment {
    Containment {
        owner: owner.clone(),
        feature: FeatureKey::from(key),
    }
}

fn mismatch(element: &ElementId, key: &str, expected: &'static str) -> NotationError {
    NotationError::FeatureKindMismatch {
        element_id: element.to_string(),
        feature: key.to_string(),
        expected,
    }
}

fn out_of_sync(record: &ChangeRecord, reason: &str) -> NotationError {
    NotationError::HistoryOutOfSync {
        element_id: record.element.to_string(),
        feature: record.feature.to_string(),
        reason: reason.to_string(),
    }
}

fn broken_back_reference(child: &ElementId, containment: &Containment) -> NotationError {
    NotationError::HistoryOutOfSync {
        element_id: containment.owner.to_string(),
        feature: containment.feature.to_string(),
        reason: format!("slot does not hold contained element {}", child),
    }
}

fn list_operands<'r>(
    record: &'r ChangeRecord,
    value: Option<&'r FeatureValue>,
) -> Result<(&'r ElementId, usize)> {
    match (value.and_then(FeatureValue::as_contained), record.index) {
        (Some(child), Some(index)) => Ok((child, index)),
        _ => Err(out_of_sync(record, "list change without contained child and index")),
    }
}
