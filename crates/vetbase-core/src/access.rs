//! Capability alias expansion for role-based access.
//!
//! Staff roles are granted capability aliases (e.g. `manage_appointments`)
//! that stand for a fixed set of fine-grained capabilities. Expansion is a
//! pure lookup over a static table; unknown names pass through unchanged so
//! fine-grained capabilities can be granted directly.

use std::collections::BTreeSet;

/// Static alias table: alias name to the capabilities it stands for.
const CAPABILITY_ALIASES: &[(&str, &[&str])] = &[
    (
        "manage_appointments",
        &[
            "appointments.read",
            "appointments.write",
            "appointments.complete",
        ],
    ),
    (
        "manage_attendances",
        &["attendances.read", "attendances.write"],
    ),
    (
        "manage_billing",
        &[
            "invoices.read",
            "invoices.write",
            "installments.read",
            "installments.write",
        ],
    ),
    ("manage_stock", &["products.read", "products.write"]),
    (
        "manage_registry",
        &["tutors.read", "tutors.write", "animals.read", "animals.write"],
    ),
    ("front_desk", &["appointments.read", "attendances.read", "tutors.read", "animals.read"]),
];

/// Expand a set of requested capability names to its closure.
///
/// Aliases are replaced by their expansion; names that are not aliases are
/// kept as-is. The result is deduplicated and ordered, and the function is
/// idempotent: expanding an already-expanded set returns it unchanged.
#[must_use]
pub fn expand_capabilities<'a, I>(requested: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut expanded = BTreeSet::new();
    for name in requested {
        match CAPABILITY_ALIASES.iter().find(|(alias, _)| *alias == name) {
            Some((_, grants)) => {
                expanded.extend(grants.iter().map(|g| (*g).to_string()));
            }
            None => {
                expanded.insert(name.to_string());
            }
        }
    }
    expanded
}
