//! Annotation search within an annotation set

use crate::config::AnnotationConfig;
use crate::error::DecodeError;
use crate::item::{AnnotationItem, AnnotationSet, Visibility};
use crate::resolver::{Resolver, StringTable};

/// Whether an item stored with `actual` visibility satisfies a search for
/// `expected`.
///
/// Runtime searches also accept Build items when legacy compatibility is
/// enabled in `config`; every other search needs an exact match.
pub fn is_visibility_compatible(
    actual: Visibility,
    expected: Visibility,
    config: &AnnotationConfig,
) -> bool {
    if expected == Visibility::Runtime
        && actual == Visibility::Build
        && config.legacy_visibility_enabled()
    {
        return true;
    }
    actual == expected
}

/// Find the first item in `set` whose type descriptor is `descriptor` and
/// whose visibility is compatible with `visibility`
pub fn search_annotation_set<'a, S: StringTable + ?Sized>(
    strings: &S,
    set: &AnnotationSet<'a>,
    descriptor: &str,
    visibility: Visibility,
    config: &AnnotationConfig,
) -> Result<Option<AnnotationItem<'a>>, DecodeError> {
    for item in set.iter() {
        if !is_visibility_compatible(item.visibility, visibility, config) {
            continue;
        }
        if item.descriptor(strings)? == descriptor {
            return Ok(Some(*item));
        }
    }
    Ok(None)
}

/// Find the first compatible item whose resolved type is `annotation_class`.
///
/// Items whose type cannot be resolved are skipped with a warning; their
/// pending failure is cleared.
pub fn find_record_by_type<'a, R: Resolver>(
    resolver: &mut R,
    set: &AnnotationSet<'a>,
    visibility: Visibility,
    annotation_class: &R::Object,
    config: &AnnotationConfig,
) -> Result<Option<AnnotationItem<'a>>, DecodeError> {
    for item in set.iter() {
        if !is_visibility_compatible(item.visibility, visibility, config) {
            continue;
        }
        let type_index = item.type_index()?;
        match resolver.resolve_type(type_index) {
            Ok(resolved) if resolved == *annotation_class => return Ok(Some(*item)),
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(%type_index, error = %err, "unable to resolve annotation class");
                resolver.clear_pending_failure();
            }
        }
    }
    Ok(None)
}

/// Find the first compatible item whose type is already loaded and is
/// `annotation_class`.
///
/// Only [`Resolver::lookup_type`] is consulted, so nothing is loaded and no
/// failure is ever left pending. Items whose type is not loaded are
/// skipped.
pub fn find_loaded_record_by_type<'a, R: Resolver>(
    resolver: &R,
    set: &AnnotationSet<'a>,
    visibility: Visibility,
    annotation_class: &R::Object,
    config: &AnnotationConfig,
) -> Result<Option<AnnotationItem<'a>>, DecodeError> {
    for item in set.iter() {
        if !is_visibility_compatible(item.visibility, visibility, config) {
            continue;
        }
        if resolver.lookup_type(item.type_index()?).as_ref() == Some(annotation_class) {
            return Ok(Some(*item));
        }
    }
    Ok(None)
}
