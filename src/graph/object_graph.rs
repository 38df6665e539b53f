use super::Object;
use crate::path::ObjectPath;

/// Read access to a hierarchical object graph.
///
/// Implementations must be safe to share across threads: expression-mode
/// membership queries keep a handle to the graph so that predicates can be
/// evaluated lazily.
pub trait ObjectGraph: Send + Sync {
    /// Looks up the object at an absolute path.
    fn object(&self, path: &ObjectPath) -> Option<Object>;

    /// The child containers of a container, ordered by path.
    fn children(&self, path: &ObjectPath) -> Vec<Object>;

    /// The leaf properties of a container, ordered by path.
    fn properties(&self, path: &ObjectPath) -> Vec<Object>;

    /// Every object below the root in pre-order: each container, then its
    /// properties, then its children.
    fn traverse(&self, include_instance_proxies: bool) -> Vec<Object> {
        let mut objects = Vec::new();
        let mut pending: Vec<Object> = self.children(&ObjectPath::root()).into_iter().rev().collect();

        while let Some(container) = pending.pop() {
            if container.is_instance_proxy() && !include_instance_proxies {
                continue;
            }

            let path = container.path().clone();
            objects.push(container);
            objects.extend(self.properties(&path));
            pending.extend(self.children(&path).into_iter().rev());
        }

        objects
    }
}
