/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::any::{Any, TypeId};

use dashmap::DashMap;
use lazy_static::lazy_static;
use serde_json::Value;
use tracing::trace;

use crate::common::CodecError;
use crate::message::Payload;
use crate::traits::StreamMessage;

type DecodeFn = fn(&Value) -> Result<Box<dyn Any + Send>, serde_json::Error>;

/// Process-wide cache mapping payload types to their wire strategies.
///
/// Populated lazily: the first encode of each type registers its tag and a
/// decode strategy keyed by that tag. The tag travels in the envelope, so a
/// receiver selects the matching strategy without reflection and without a
/// registry shared between nodes.
#[derive(Debug, Default)]
pub struct SerializerCache {
    tags: DashMap<TypeId, &'static str>,
    decoders: DashMap<&'static str, DecodeFn>,
}

impl SerializerCache {
    /// Encodes a message into its type-tagged wire payload.
    pub fn encode<T: StreamMessage>(&self, message: &T) -> Result<Payload, CodecError> {
        if !self.tags.contains_key(&TypeId::of::<T>()) {
            trace!(tag = T::TYPE_TAG, "registering serialization strategy");
            self.decoders.insert(T::TYPE_TAG, decode_erased::<T>);
            self.tags.insert(TypeId::of::<T>(), T::TYPE_TAG);
        }
        Ok(Payload {
            type_tag: T::TYPE_TAG.to_string(),
            value: serde_json::to_value(message)?,
        })
    }

    /// Decodes a payload into a statically known message type.
    pub fn decode<T: StreamMessage>(&self, payload: &Payload) -> Result<T, CodecError> {
        if payload.type_tag != T::TYPE_TAG {
            return Err(CodecError::TagMismatch {
                expected: T::TYPE_TAG,
                found: payload.type_tag.clone(),
            });
        }
        Ok(serde_json::from_value(payload.value.clone())?)
    }

    /// Decodes a payload through the strategy registered for its tag.
    ///
    /// Fails with [`CodecError::UnknownTag`] if no strategy has been
    /// registered in this process, which happens when the tagged type was
    /// never encoded nor decoded statically here.
    pub fn decode_any(&self, payload: &Payload) -> Result<Box<dyn Any + Send>, CodecError> {
        let decode = *self
            .decoders
            .get(payload.type_tag.as_str())
            .ok_or_else(|| CodecError::UnknownTag(payload.type_tag.clone()))?
            .value();
        Ok(decode(&payload.value)?)
    }
}

fn decode_erased<T: StreamMessage>(value: &Value) -> Result<Box<dyn Any + Send>, serde_json::Error> {
    Ok(Box::new(serde_json::from_value::<T>(value.clone())?))
}

lazy_static! {
    /// The process-wide serializer cache.
    pub static ref CODEC: SerializerCache = SerializerCache::default();
}
