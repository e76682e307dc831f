use chrono_tz::Tz;

use crate::error::RenderError;
use crate::time::render_time;
use crate::types::Actor;

/// `**Name | @handle** <how> at <when>:`
pub fn render_who_when(
    display_name: &str,
    handle: &str,
    when: &str,
    how: &str,
    zone: Tz,
) -> Result<String, RenderError> {
    Ok(format!(
        "**{display_name} | @{handle}** {how} at {}:",
        render_time(when, zone)?
    ))
}

/// Attribution line for an ask. Anonymous askers skip the bold name and handle.
pub fn render_asker(who: &Actor, when: &str, zone: Tz) -> Result<String, RenderError> {
    match who {
        Actor::Named {
            display_name,
            handle,
        } => render_who_when(display_name, handle, when, "asked", zone),
        Actor::Anonymous => Ok(format!("anon asked at {}:", render_time(when, zone)?)),
    }
}

/// Attribution line for the poster of a post.
pub fn render_poster(who: &Actor, when: &str, zone: Tz) -> Result<String, RenderError> {
    match who {
        Actor::Named {
            display_name,
            handle,
        } => render_who_when(display_name, handle, when, "said", zone),
        Actor::Anonymous => Err(RenderError::AnonymousPoster),
    }
}
