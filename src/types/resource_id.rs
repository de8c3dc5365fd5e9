// ABOUTME: Phantom-typed remote resource identifiers for compile-time type safety.
// ABOUTME: Renders subscription/group/provider paths and prevents mixing resource kinds.

use serde::{Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Describes how a kind of remote resource is addressed.
///
/// `TYPES` lists the path segment types from the outermost parent down to the
/// resource itself, e.g. `["labs", "virtualmachines"]`.
pub trait ResourceKind {
    const PROVIDER: &'static str;
    const TYPES: &'static [&'static str];
}

/// Marker types for phantom type parameters.
/// Using empty enums prevents instantiation and requires no trait bounds.
pub enum LabMarker {}
pub enum VirtualMachineMarker {}
pub enum CustomImageMarker {}
pub enum NetworkInterfaceMarker {}
pub enum GalleryImageMarker {}
pub enum GalleryImageVersionMarker {}

impl ResourceKind for LabMarker {
    const PROVIDER: &'static str = "Microsoft.DevTestLab";
    const TYPES: &'static [&'static str] = &["labs"];
}

impl ResourceKind for VirtualMachineMarker {
    const PROVIDER: &'static str = "Microsoft.DevTestLab";
    const TYPES: &'static [&'static str] = &["labs", "virtualmachines"];
}

impl ResourceKind for CustomImageMarker {
    const PROVIDER: &'static str = "Microsoft.DevTestLab";
    const TYPES: &'static [&'static str] = &["labs", "customimages"];
}

impl ResourceKind for NetworkInterfaceMarker {
    const PROVIDER: &'static str = "Microsoft.Network";
    const TYPES: &'static [&'static str] = &["networkInterfaces"];
}

impl ResourceKind for GalleryImageMarker {
    const PROVIDER: &'static str = "Microsoft.Compute";
    const TYPES: &'static [&'static str] = &["galleries", "images"];
}

impl ResourceKind for GalleryImageVersionMarker {
    const PROVIDER: &'static str = "Microsoft.Compute";
    const TYPES: &'static [&'static str] = &["galleries", "images", "versions"];
}

/// A structured identifier for a remote resource.
///
/// The kind parameter makes a `VirtualMachineId` and a `CustomImageId`
/// distinct types, so an image id can't be handed to a machine operation.
#[must_use = "IDs reference resources and should not be ignored"]
pub struct ResourceId<K> {
    subscription: String,
    resource_group: String,
    parents: Vec<String>,
    name: String,
    _kind: PhantomData<K>,
}

impl<K: ResourceKind> ResourceId<K> {
    fn build(
        subscription: &str,
        resource_group: &str,
        parents: Vec<String>,
        name: &str,
    ) -> Self {
        debug_assert_eq!(parents.len() + 1, K::TYPES.len());
        Self {
            subscription: subscription.to_string(),
            resource_group: resource_group.to_string(),
            parents,
            name: name.to_string(),
            _kind: PhantomData,
        }
    }

    pub fn subscription(&self) -> &str {
        &self.subscription
    }

    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same resource addressed through a different resource group.
    pub fn in_resource_group(&self, resource_group: &str) -> Self {
        Self {
            resource_group: resource_group.to_string(),
            ..self.clone()
        }
    }

    /// Full ARM-style path, with every user-supplied segment percent-encoded.
    pub fn path(&self) -> String {
        let mut path = format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}",
            urlencoding::encode(&self.subscription),
            urlencoding::encode(&self.resource_group),
            K::PROVIDER
        );
        let names = self
            .parents
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()));
        for (kind, name) in K::TYPES.iter().zip(names) {
            path.push('/');
            path.push_str(kind);
            path.push('/');
            path.push_str(&urlencoding::encode(name));
        }
        path
    }
}

impl ResourceId<LabMarker> {
    pub fn lab(subscription: &str, resource_group: &str, lab: &str) -> Self {
        Self::build(subscription, resource_group, Vec::new(), lab)
    }

    pub fn virtual_machine(&self, name: &str) -> VirtualMachineId {
        ResourceId::build(
            &self.subscription,
            &self.resource_group,
            vec![self.name.clone()],
            name,
        )
    }

    pub fn custom_image(&self, name: &str) -> CustomImageId {
        ResourceId::build(
            &self.subscription,
            &self.resource_group,
            vec![self.name.clone()],
            name,
        )
    }
}

impl ResourceId<VirtualMachineMarker> {
    /// Name of the lab the machine lives in.
    pub fn lab_name(&self) -> &str {
        &self.parents[0]
    }
}

impl ResourceId<CustomImageMarker> {
    pub fn lab_name(&self) -> &str {
        &self.parents[0]
    }
}

impl ResourceId<NetworkInterfaceMarker> {
    pub fn network_interface(subscription: &str, resource_group: &str, name: &str) -> Self {
        Self::build(subscription, resource_group, Vec::new(), name)
    }
}

impl ResourceId<GalleryImageMarker> {
    pub fn gallery_image(
        subscription: &str,
        resource_group: &str,
        gallery: &str,
        image: &str,
    ) -> Self {
        Self::build(subscription, resource_group, vec![gallery.to_string()], image)
    }

    pub fn gallery_name(&self) -> &str {
        &self.parents[0]
    }

    pub fn version(&self, version: &str) -> GalleryImageVersionId {
        let mut parents = self.parents.clone();
        parents.push(self.name.clone());
        ResourceId::build(&self.subscription, &self.resource_group, parents, version)
    }
}

// Manual trait implementations that don't require K to implement the trait.
// This is necessary because K is only used as a phantom type marker.

impl<K> std::fmt::Debug for ResourceId<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceId")
            .field("subscription", &self.subscription)
            .field("resource_group", &self.resource_group)
            .field("parents", &self.parents)
            .field("name", &self.name)
            .finish()
    }
}

impl<K> Clone for ResourceId<K> {
    fn clone(&self) -> Self {
        Self {
            subscription: self.subscription.clone(),
            resource_group: self.resource_group.clone(),
            parents: self.parents.clone(),
            name: self.name.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K> PartialEq for ResourceId<K> {
    fn eq(&self, other: &Self) -> bool {
        self.subscription.eq_ignore_ascii_case(&other.subscription)
            && self.resource_group.eq_ignore_ascii_case(&other.resource_group)
            && self.parents == other.parents
            && self.name == other.name
    }
}

impl<K> Eq for ResourceId<K> {}

impl<K> Hash for ResourceId<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.subscription.to_ascii_lowercase().hash(state);
        self.resource_group.to_ascii_lowercase().hash(state);
        self.parents.hash(state);
        self.name.hash(state);
    }
}

impl<K: ResourceKind> std::fmt::Display for ResourceId<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

impl<K: ResourceKind> Serialize for ResourceId<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.path().serialize(serializer)
    }
}

pub type LabId = ResourceId<LabMarker>;
pub type VirtualMachineId = ResourceId<VirtualMachineMarker>;
pub type CustomImageId = ResourceId<CustomImageMarker>;
pub type NetworkInterfaceId = ResourceId<NetworkInterfaceMarker>;
pub type GalleryImageId = ResourceId<GalleryImageMarker>;
pub type GalleryImageVersionId = ResourceId<GalleryImageVersionMarker>;
