use super::{ViewId, ViewTree};
use crate::error::ViewResult;

/// Stable sort by z-index ascending; equal z-indices keep insertion order.
pub(crate) fn stacking_order(children: &[ViewId], z_index: impl Fn(ViewId) -> i32) -> Vec<ViewId> {
    let mut ordered = children.to_vec();
    ordered.sort_by_key(|view| z_index(*view));
    ordered
}

impl ViewTree {
    /// Children in raw insertion order.
    pub fn get_views(&self, view: ViewId) -> ViewResult<Vec<ViewId>> {
        Ok(self.node(view)?.children.clone())
    }

    /// Children in z-index order, computed from current state without
    /// committing anything.
    pub fn get_rearranged_views(&self, view: ViewId) -> ViewResult<Vec<ViewId>> {
        let node = self.node(view)?;
        Ok(stacking_order(&node.children, |child| {
            self.nodes.get(child).map_or(0, |node| node.z_index)
        }))
    }

    /// Order last committed to the compositor. Paint and hit-testing use it.
    pub fn get_natively_rearranged_views(&self, view: ViewId) -> ViewResult<Vec<ViewId>> {
        Ok(self.node(view)?.native_order.clone())
    }

    /// Commits `get_rearranged_views` to the compositor.
    pub fn rearrange_child_views(&mut self, view: ViewId) -> ViewResult<()> {
        let ordered = self.get_rearranged_views(view)?;
        let node = self.node_mut(view)?;
        if node.native_order == ordered {
            return Ok(());
        }
        node.native_order = ordered;
        self.compositor.request_redraw();
        tracing::debug!(?view, "child views rearranged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::TreeConfig;

    fn container_with(tree: &mut ViewTree, z_indices: &[i32]) -> (ViewId, Vec<ViewId>) {
        let parent = tree.create_view();
        let children: Vec<ViewId> = z_indices
            .iter()
            .map(|z| {
                let child = tree.create_view();
                tree.set_z_index(child, *z).expect("z-index on new view");
                tree.add_child_view(parent, child, None).expect("attach child");
                child
            })
            .collect();
        (parent, children)
    }

    #[test]
    fn four_children_sort_by_z_index() {
        let mut tree = ViewTree::with_config(TreeConfig::new());
        let (parent, children) = container_with(&mut tree, &[2, 4, 1, 3]);
        let expected = vec![children[2], children[0], children[3], children[1]];

        assert_eq!(tree.get_views(parent).unwrap(), children);
        assert_eq!(tree.get_rearranged_views(parent).unwrap(), expected);
        assert_eq!(tree.get_natively_rearranged_views(parent).unwrap(), children);

        tree.rearrange_child_views(parent).unwrap();
        assert_eq!(tree.get_natively_rearranged_views(parent).unwrap(), expected);
        tree.rearrange_child_views(parent).unwrap();
        assert_eq!(tree.get_natively_rearranged_views(parent).unwrap(), expected);
    }

    #[test]
    fn ties_keep_insertion_order_regardless_of_when_z_is_set() {
        // Pseudo-random z-indices, assigned both before and after attachment.
        let mut seed = 0x2545_f491_u32;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            seed
        };
        for round in 0..20 {
            let mut tree = ViewTree::with_config(TreeConfig::new());
            let parent = tree.create_view();
            let count = 3 + (next() % 12) as usize;
            let mut children = Vec::new();
            let mut z = Vec::new();
            for i in 0..count {
                let child = tree.create_view();
                let value = (next() % 5) as i32 - 2;
                if (i + round) % 2 == 0 {
                    tree.set_z_index(child, value).unwrap();
                    tree.add_child_view(parent, child, None).unwrap();
                } else {
                    tree.add_child_view(parent, child, None).unwrap();
                    tree.set_z_index(child, value).unwrap();
                }
                children.push(child);
                z.push(value);
            }

            let mut expected: Vec<usize> = (0..count).collect();
            expected.sort_by_key(|i| z[*i]);
            let expected: Vec<ViewId> = expected.into_iter().map(|i| children[i]).collect();

            assert_eq!(tree.get_rearranged_views(parent).unwrap(), expected);
            tree.rearrange_child_views(parent).unwrap();
            tree.rearrange_child_views(parent).unwrap();
            assert_eq!(tree.get_natively_rearranged_views(parent).unwrap(), expected);
        }
    }

    #[test]
    fn z_index_change_is_not_committed_until_rearranged() {
        let mut tree = ViewTree::with_config(TreeConfig::new());
        let (parent, children) = container_with(&mut tree, &[0, 0]);
        tree.set_z_index(children[0], 10).unwrap();
        assert_eq!(tree.get_natively_rearranged_views(parent).unwrap(), children);
        assert_eq!(
            tree.get_rearranged_views(parent).unwrap(),
            vec![children[1], children[0]]
        );
    }

    #[test]
    fn child_attached_after_commit_is_appended_to_native_order() {
        let mut tree = ViewTree::with_config(TreeConfig::new());
        let (parent, children) = container_with(&mut tree, &[5, 1]);
        tree.rearrange_child_views(parent).unwrap();
        let late = tree.create_view();
        tree.add_child_view(parent, late, None).unwrap();
        assert_eq!(
            tree.get_natively_rearranged_views(parent).unwrap(),
            vec![children[1], children[0], late]
        );
    }
}
