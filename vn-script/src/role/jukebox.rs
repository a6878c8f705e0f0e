//! # Jukebox 角色
//!
//! 背景音乐。曲目名通过配置中的曲目表映射到资源路径。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StepError;
use crate::role::{Role, RoleKind};
use crate::step_kind::{ArgSpec, PauseKind, StepContext, StepKind, no_check};
use crate::value::{ArgType, ArgValue, number_arg, text_arg};

/// 点唱机配置
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JukeboxConfig {
    /// 曲目名 -> 资源路径
    pub tracks: BTreeMap<String, String>,
}

/// 点唱机状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JukeboxState {
    /// 正在播放的曲目名
    pub track: Option<String>,
    /// 音量 (0.0 - 1.0)
    pub volume: f64,
}

impl Default for JukeboxState {
    fn default() -> Self {
        Self {
            track: None,
            volume: 1.0,
        }
    }
}

state_variant!(JukeboxState, Jukebox);

pub(crate) static STEP_KINDS: &[StepKind] = &[
    StepKind {
        name: "play",
        args: &[ArgSpec::new("track", ArgType::Track)],
        pause: PauseKind::None,
        major_transition: false,
        check: check_track,
        apply: apply_play,
    },
    StepKind {
        name: "stop",
        args: &[],
        pause: PauseKind::None,
        major_transition: false,
        check: no_check,
        apply: apply_stop,
    },
    StepKind {
        name: "set_volume",
        args: &[ArgSpec::new("volume", ArgType::Number)],
        pause: PauseKind::None,
        major_transition: false,
        check: check_volume,
        apply: apply_set_volume,
    },
];

fn apply_play(ctx: &mut StepContext<'_>, args: &[ArgValue]) -> Result<(), StepError> {
    let track = text_arg(args, 0);
    ctx.state::<JukeboxState>()?.track = (!track.is_empty()).then(|| track.to_string());
    Ok(())
}

fn apply_stop(ctx: &mut StepContext<'_>, _args: &[ArgValue]) -> Result<(), StepError> {
    ctx.state::<JukeboxState>()?.track = None;
    Ok(())
}

fn apply_set_volume(ctx: &mut StepContext<'_>, args: &[ArgValue]) -> Result<(), StepError> {
    if let Some(volume) = number_arg(args, 0) {
        ctx.state::<JukeboxState>()?.volume = volume.clamp(0.0, 1.0);
    }
    Ok(())
}

fn check_track(role: &Role, args: &[ArgValue]) -> Vec<String> {
    let track = text_arg(args, 0);
    match role.kind() {
        RoleKind::Jukebox(config) if config.tracks.contains_key(track) => Vec::new(),
        _ => vec![format!("曲目 '{track}' 不在 '{}' 的曲目表中", role.name())],
    }
}

fn check_volume(_role: &Role, args: &[ArgValue]) -> Vec<String> {
    match number_arg(args, 0) {
        Some(volume) if !(0.0..=1.0).contains(&volume) => {
            vec![format!("音量必须在 0.0 - 1.0 之间，实际 {volume}")]
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beat::Beat;
    use crate::role::RoleId;

    fn jukebox() -> Role {
        Role::jukebox(
            "music",
            BTreeMap::from([("theme".to_string(), "audio/theme.ogg".to_string())]),
        )
    }

    #[test]
    fn test_track_check() {
        let role = jukebox();
        assert!(check_track(&role, &[ArgValue::text("theme")]).is_empty());
        assert_eq!(check_track(&role, &[ArgValue::text("battle")]).len(), 1);
    }

    #[test]
    fn test_volume_is_clamped() {
        let role = jukebox();
        let mut beat = Beat::initial(std::slice::from_ref(&role));
        let mut ctx = StepContext::new(&role, RoleId::new(0), &mut beat);
        apply_set_volume(&mut ctx, &[ArgValue::Number(3.0)]).unwrap();
        assert_eq!(ctx.state::<JukeboxState>().unwrap().volume, 1.0);
        assert_eq!(check_volume(&role, &[ArgValue::Number(3.0)]).len(), 1);
    }

    #[test]
    fn test_play_and_stop() {
        let role = jukebox();
        let mut beat = Beat::initial(std::slice::from_ref(&role));
        let mut ctx = StepContext::new(&role, RoleId::new(0), &mut beat);
        apply_play(&mut ctx, &[ArgValue::text("theme")]).unwrap();
        assert_eq!(
            ctx.state::<JukeboxState>().unwrap().track.as_deref(),
            Some("theme")
        );
        apply_stop(&mut ctx, &[]).unwrap();
        assert_eq!(ctx.state::<JukeboxState>().unwrap().track, None);
    }
}
