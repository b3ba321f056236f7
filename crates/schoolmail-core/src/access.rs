/*
Copyright 2024, Zep Software, Inc.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Who may see a message, and in what capacity.

use crate::{message::Message, roles::audience_includes, session::Caller};

/// The caller is entitled to the message as a recipient: they are its
/// receiver, or it is a broadcast addressed to their role. A broadcast
/// author whose role is in the audience receives it too.
pub fn is_recipient(message: &Message, caller: &Caller) -> bool {
    if message.is_broadcast {
        audience_includes(message.target_role, caller.role)
    } else {
        message.receiver_id.as_deref() == Some(caller.user_id.as_str())
    }
}

pub fn is_sender(message: &Message, caller: &Caller) -> bool {
    message.sender_id == caller.user_id
}

/// Sender or recipient.
pub fn can_view(message: &Message, caller: &Caller) -> bool {
    is_sender(message, caller) || is_recipient(message, caller)
}
