//! Host-facing property schema.
//!
//! The host owns the actual property panel; this module only describes
//! what to put in it. Keys match the [`upscale_core::FilterConfig`]
//! fields the host writes back.

use upscale_core::{SCALE_PERCENT_MAX, SCALE_PERCENT_MIN};

/// Config key for the provider selector.
pub const KEY_PROVIDER: &str = "provider";
/// Config key for the strength class.
pub const KEY_STRENGTH: &str = "superres.strength";
/// Config key for the scale slider.
pub const KEY_SCALE: &str = "superres.scale";

/// One entry of the property panel.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// Fixed-choice selector. Options are `(value, label)` pairs.
    Select {
        /// Config key the host writes the choice to.
        key: &'static str,
        /// Display label.
        label: &'static str,
        /// Selectable `(value, label)` pairs.
        options: Vec<(String, String)>,
    },
    /// Float slider.
    Slider {
        /// Config key the host writes the value to.
        key: &'static str,
        /// Display label.
        label: &'static str,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
        /// Step size.
        step: f64,
        /// Unit suffix.
        suffix: &'static str,
    },
}

/// The per-provider parameter group: strength class plus scale slider.
pub fn superres_properties() -> Vec<Property> {
    vec![
        Property::Select {
            key: KEY_STRENGTH,
            label: "Strength",
            options: vec![
                ("weak".into(), "Weak".into()),
                ("strong".into(), "Strong".into()),
            ],
        },
        Property::Slider {
            key: KEY_SCALE,
            label: "Scale",
            min: SCALE_PERCENT_MIN,
            max: SCALE_PERCENT_MAX,
            step: 0.01,
            suffix: " %",
        },
    ]
}
