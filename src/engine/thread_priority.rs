// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};
use tracing::{info, warn};

/// Default priority for the tick threads when DACSYNTH_THREAD_PRIORITY is unset.
const DEFAULT_TICK_THREAD_PRIORITY: u8 = 70;

/// Reads DACSYNTH_THREAD_PRIORITY (0-99), falling back to the default.
pub fn tick_thread_priority() -> Option<ThreadPriorityValue> {
    std::env::var("DACSYNTH_THREAD_PRIORITY")
        .ok()
        .and_then(|v| {
            let n = v.parse::<u8>().ok()?;
            (n < 100).then(|| ThreadPriorityValue::try_from(n).ok())?
        })
        .or_else(|| ThreadPriorityValue::try_from(DEFAULT_TICK_THREAD_PRIORITY).ok())
}

pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| {
            v == "1"
                || v.eq_ignore_ascii_case("true")
                || v.eq_ignore_ascii_case("yes")
                || v.eq_ignore_ascii_case("on")
        })
        .unwrap_or(false)
}

/// Returns whether we should attempt RT (SCHED_FIFO) scheduling for the tick threads.
/// Default: enabled. Opt out with DACSYNTH_DISABLE_RT_AUDIO=1.
pub fn rt_enabled() -> bool {
    !env_flag("DACSYNTH_DISABLE_RT_AUDIO")
}

/// Raises the calling thread's priority. Failures are logged; the thread keeps running at
/// whatever priority it has.
pub fn configure_tick_thread_priority(thread: &str) {
    let Some(priority) = tick_thread_priority() else {
        return;
    };
    let tp = ThreadPriority::Crossplatform(priority);
    if let Err(e) = set_current_thread_priority(tp) {
        warn!(thread, error = %e, "Failed to raise thread priority");
    }

    #[cfg(unix)]
    if rt_enabled() {
        use thread_priority::unix::{
            set_thread_priority_and_policy, thread_native_id, RealtimeThreadSchedulePolicy,
            ThreadSchedulePolicy,
        };
        let tid = thread_native_id();
        match set_thread_priority_and_policy(
            tid,
            tp,
            ThreadSchedulePolicy::Realtime(RealtimeThreadSchedulePolicy::Fifo),
        ) {
            Ok(()) => {
                info!(thread, "Enabled RT SCHED_FIFO");
            }
            Err(e) => {
                warn!(thread, error = %e, "Failed to set RT SCHED_FIFO");
            }
        }
    }
}
