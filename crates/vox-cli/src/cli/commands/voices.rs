use vox_core::config::{AVAILABLE_VOICES, default_voice};

pub fn list() {
    let default = default_voice();
    for voice in AVAILABLE_VOICES {
        let marker = if voice == default { "*" } else { " " };
        println!(
            "{marker} {:<8} {:<16} {} {}",
            voice.name, voice.canonical_name, voice.metadata.accent, voice.metadata.gender
        );
    }
}
