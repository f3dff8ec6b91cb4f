//! URL slugs for suppliers and departments.

use crate::search::normalize::fold_accents;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect,
    QueryTrait,
};
use std::collections::HashSet;

pub const MAX_SLUG_LEN: usize = 64;
// room for a "-NNN" collision suffix
const MAX_BASE_LEN: usize = MAX_SLUG_LEN - 8;
const FALLBACK_SLUG: &str = "sin-nombre";

/// Lowercase ASCII words joined by `-`: "Ministerio de Salud Pública" becomes
/// "ministerio-de-salud-publica". Other punctuation is dropped.
pub fn slugify(name: &str) -> String {
    let folded = fold_accents(&name.to_lowercase());
    let mut slug = String::with_capacity(folded.len());
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
    }
    slug.truncate(MAX_BASE_LEN);
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// `base`, or `base-2`, `base-3`… whichever is not yet taken in `slug_column`.
/// The row `exclude_id` (the one being renamed) does not count as a clash.
pub async fn unique_slug<E, C>(
    conn: &C,
    slug_column: E::Column,
    id_column: E::Column,
    base: &str,
    exclude_id: Option<i64>,
) -> Result<String, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let taken: HashSet<String> = E::find()
        .select_only()
        .column(slug_column)
        .filter(
            Condition::any()
                .add(slug_column.eq(base))
                .add(slug_column.like(format!("{}-%", base))),
        )
        .apply_if(exclude_id, |query, id| query.filter(id_column.ne(id)))
        .into_tuple::<String>()
        .all(conn)
        .await?
        .into_iter()
        .collect();

    if !taken.contains(base) {
        return Ok(base.to_string());
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Ministerio de Salud Pública", "ministerio-de-salud-publica")]
    #[case("ACME S.A.", "acme-sa")]
    #[case("  Droguería   del Sud  ", "drogueria-del-sud")]
    #[case("Año 2024 / Obras", "ano-2024-obras")]
    #[case("¡¿?!", "sin-nombre")]
    fn slugifies_names(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(slugify(name), expected);
    }

    #[test]
    fn leaves_room_for_suffix() {
        let long = "palabra ".repeat(20);
        let slug = slugify(&long);
        assert!(slug.len() <= MAX_SLUG_LEN - 8);
        assert!(!slug.ends_with('-'));
    }
}
