//! Dependency ordering.

use std::collections::HashMap;

use crate::error::WorkspaceError;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnStack,
    Done,
}

/// Order `items` so that every item comes after the items it depends on.
///
/// Edges are name-based: `deps_of` returns names, `name_of` identifies items.
/// Names that match no item are ignored. Independent items keep their input
/// order. A cycle fails with [`WorkspaceError::CircularDependency`] and no
/// partial result.
pub fn sort_by_dependencies<T, N, D>(items: &[T], name_of: N, deps_of: D) -> anyhow::Result<Vec<T>>
where
    T: Clone,
    N: Fn(&T) -> String,
    D: Fn(&T) -> Vec<String>,
{
    let by_name: HashMap<String, usize> = items
        .iter()
        .enumerate()
        .map(|(i, item)| (name_of(item), i))
        .collect();

    let mut marks: HashMap<usize, Mark> = HashMap::new();
    let mut order = Vec::with_capacity(items.len());

    for start in 0..items.len() {
        visit(start, items, &by_name, &name_of, &deps_of, &mut marks, &mut order)?;
    }

    Ok(order.into_iter().map(|i| items[i].clone()).collect())
}

fn visit<T, N, D>(
    index: usize,
    items: &[T],
    by_name: &HashMap<String, usize>,
    name_of: &N,
    deps_of: &D,
    marks: &mut HashMap<usize, Mark>,
    order: &mut Vec<usize>,
) -> anyhow::Result<()>
where
    N: Fn(&T) -> String,
    D: Fn(&T) -> Vec<String>,
{
    match marks.get(&index) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::OnStack) => {
            return Err(WorkspaceError::CircularDependency {
                node: name_of(&items[index]),
            }
            .into());
        }
        None => {}
    }

    marks.insert(index, Mark::OnStack);
    for dep in deps_of(&items[index]) {
        if let Some(&dep_index) = by_name.get(&dep) {
            visit(dep_index, items, by_name, name_of, deps_of, marks, order)?;
        }
    }
    marks.insert(index, Mark::Done);
    order.push(index);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, deps: &[&str]) -> (String, Vec<String>) {
        (name.to_string(), deps.iter().map(|d| d.to_string()).collect())
    }

    fn sort(items: &[(String, Vec<String>)]) -> anyhow::Result<Vec<String>> {
        Ok(sort_by_dependencies(items, |i| i.0.clone(), |i| i.1.clone())?
            .into_iter()
            .map(|i| i.0)
            .collect())
    }

    #[test]
    fn dependencies_come_first() {
        let items = vec![
            node("app", &["utils", "core"]),
            node("utils", &["core"]),
            node("core", &[]),
        ];
        assert_eq!(sort(&items).unwrap(), vec!["core", "utils", "app"]);
    }

    #[test]
    fn independent_items_keep_input_order() {
        let items = vec![node("b", &[]), node("a", &["rxjs"]), node("c", &[])];
        assert_eq!(sort(&items).unwrap(), vec!["b", "a", "c"]);
    }

    #[test]
    fn cycle_is_reported() {
        let items = vec![node("a", &["b"]), node("b", &["c"]), node("c", &["a"])];
        let err = sort(&items).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WorkspaceError>(),
            Some(WorkspaceError::CircularDependency { .. })
        ));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let items = vec![node("a", &["a"])];
        assert!(sort(&items).is_err());
    }
}
