//! Testing utilities and mock implementations.
//!
//! Mocks stand in for the upstream guide source and the refresh scheduler so
//! the store, index, scheduler and HTTP layers can be exercised without a
//! live TVHeadend server.
//!
//! # Example
//!
//! ```rust,ignore
//! use epg_cache_core::testing::{fixtures, MockEpgSource};
//!
//! let source = MockEpgSource::new();
//! source.set_events(vec![fixtures::event(1, "ch-1", "Tagesschau", 1000, 2000)]).await;
//! ```

mod mock_refresh_control;
mod mock_source;

pub use mock_refresh_control::MockRefreshControl;
pub use mock_source::MockEpgSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::upstream::{Channel, EpgEvent};

    /// Create an event with only the required fields set.
    ///
    /// The channel name is derived from the channel UUID.
    pub fn event(event_id: i64, channel_uuid: &str, title: &str, start: i64, stop: i64) -> EpgEvent {
        EpgEvent {
            event_id,
            channel_uuid: channel_uuid.to_string(),
            channel_name: format!("Channel {}", channel_uuid),
            channel_number: None,
            channel_icon: None,
            start,
            stop,
            duration: None,
            title: title.to_string(),
            subtitle: None,
            summary: None,
            description: None,
            genre: None,
            content_type: None,
            series_link: None,
            episode_number: None,
            season_number: None,
            part_number: None,
            part_count: None,
            episode_uri: None,
            image: None,
            next_event_id: None,
            age_rating: None,
            star_rating: None,
            hd: None,
            widescreen: None,
            audio_desc: None,
            subtitled: None,
        }
    }

    /// Create a channel. `enabled` is left unset (treated as enabled).
    pub fn channel(uuid: &str, name: &str, number: Option<i64>) -> Channel {
        Channel {
            uuid: uuid.to_string(),
            enabled: None,
            name: name.to_string(),
            number,
            icon: None,
            icon_public_url: None,
        }
    }

    /// Write a small picon build-source tree into `dir`.
    ///
    /// Service names: `daserstehd`, `zdfhd`, `rtlhd` (no logo file),
    /// `pngonly`, `bothformats` and `withvariants` (dark svg, light png).
    /// Service references: `1D5_B_1_130000` and `1D8_B_1_130000`.
    pub fn write_picon_source(dir: &Path) {
        let snp = "daserstehd=daserste\n\
                   zdfhd=zdf\n\
                   rtlhd=rtl\n\
                   pngonly=pngchannel\n\
                   bothformats=bothchannel\n\
                   withvariants=variantchannel\n";
        let srp = "1D5_B_1_130000=daserste\n\
                   1D8_B_1_130000=zdf\n";

        std::fs::write(dir.join("snp.index"), snp).expect("write snp.index");
        std::fs::write(dir.join("srp.index"), srp).expect("write srp.index");

        let logos = dir.join("logos");
        std::fs::create_dir_all(&logos).expect("create logos dir");
        for (file, content) in [
            ("daserste.default.svg", "<svg>daserste</svg>"),
            ("zdf.default.svg", "<svg>zdf</svg>"),
            ("pngchannel.default.png", "png-bytes"),
            ("bothchannel.default.svg", "<svg>both</svg>"),
            ("bothchannel.default.png", "png-both"),
            ("variantchannel.default.svg", "<svg>variant</svg>"),
            ("variantchannel.dark.svg", "<svg>dark</svg>"),
            ("variantchannel.light.png", "png-light"),
        ] {
            std::fs::write(logos.join(file), content).expect("write logo");
        }
    }
}
