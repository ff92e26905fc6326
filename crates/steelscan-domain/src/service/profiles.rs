//! Destination profile maintenance

use steelscan_types::region::normalize_regions;
use steelscan_types::{DestinationProfile, ProfilePatch};

/// Apply a partial update in place. Region codes are normalized so the
/// set stays inside the universe without duplicates.
pub fn apply_patch(profile: &mut DestinationProfile, patch: &ProfilePatch) {
    if let Some(ref name) = patch.name {
        profile.name = name.clone();
    }
    if let Some(ref brand) = patch.brand {
        profile.brand = brand.clone();
    }
    if let Some(ref phone) = patch.phone {
        profile.phone = phone.clone();
    }
    if let Some(ref url) = patch.configurator_url {
        profile.configurator_url = url.clone();
    }
    if let Some(ref description) = patch.description {
        profile.description = description.clone();
    }
    if let Some(rule) = patch.width {
        profile.rules.width = rule;
    }
    if let Some(rule) = patch.length {
        profile.rules.length = rule;
    }
    if let Some(rule) = patch.height {
        profile.rules.height = rule;
    }
    if let Some(allow) = patch.allow_red_iron {
        profile.rules.allow_red_iron = allow;
    }
    if let Some(allow) = patch.allow_galvanized {
        profile.rules.allow_galvanized = allow;
    }
    if let Some(ref states) = patch.states {
        profile.rules.states = normalize_regions(states);
    }
}

/// The selected profile, falling back to the first one
pub fn active_profile<'a>(
    profiles: &'a [DestinationProfile],
    selected_id: &str,
) -> Option<&'a DestinationProfile> {
    profiles
        .iter()
        .find(|p| p.id == selected_id)
        .or_else(|| profiles.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use steelscan_types::DimensionRule;

    #[test]
    fn test_patch_touches_only_given_fields() {
        let mut profile = DestinationProfile::new_template("abc");
        let patch = ProfilePatch {
            brand: Some("Ironclad".to_string()),
            width: Some(DimensionRule::enabled(2.0)),
            states: Some(vec!["tx".into(), "OK".into(), "TX".into(), "PR".into()]),
            ..Default::default()
        };
        apply_patch(&mut profile, &patch);

        assert_eq!(profile.brand, "Ironclad");
        assert_eq!(profile.name, "New Website");
        assert_eq!(profile.rules.width, DimensionRule::enabled(2.0));
        assert_eq!(profile.rules.length, DimensionRule::enabled(0.0));
        assert_eq!(profile.rules.states, vec!["OK", "TX"]);
    }

    #[test]
    fn test_active_profile_fallback() {
        let profiles = vec![
            DestinationProfile::new_template("a"),
            DestinationProfile::new_template("b"),
        ];
        assert_eq!(active_profile(&profiles, "b").map(|p| p.id.as_str()), Some("b"));
        assert_eq!(active_profile(&profiles, "zzz").map(|p| p.id.as_str()), Some("a"));
        assert!(active_profile(&[], "a").is_none());
    }
}
