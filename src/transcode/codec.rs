// tonic codec over reflected protobuf messages
// Author: kelexine (https://github.com/kelexine)

use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor};
use tonic::codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder};
use tonic::Status;

/// A [`Codec`] that sends [`DynamicMessage`]s as-is and decodes replies
/// against the output descriptor of the method being called.
#[derive(Debug, Clone)]
pub struct DynamicCodec {
    response: MessageDescriptor,
}

impl DynamicCodec {
    pub fn new(response: MessageDescriptor) -> Self {
        Self { response }
    }
}

impl Codec for DynamicCodec {
    type Encode = DynamicMessage;
    type Decode = DynamicMessage;
    type Encoder = DynamicEncoder;
    type Decoder = DynamicDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        DynamicEncoder
    }

    fn decoder(&mut self) -> Self::Decoder {
        DynamicDecoder(self.response.clone())
    }
}

#[derive(Debug)]
pub struct DynamicEncoder;

impl Encoder for DynamicEncoder {
    type Item = DynamicMessage;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        item.encode(dst)
            .map_err(|e| Status::internal(format!("failed to encode request: {}", e)))
    }
}

#[derive(Debug)]
pub struct DynamicDecoder(MessageDescriptor);

impl Decoder for DynamicDecoder {
    type Item = DynamicMessage;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        let message = DynamicMessage::decode(self.0.clone(), src)
            .map_err(|e| Status::internal(format!("failed to decode response: {}", e)))?;
        Ok(Some(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::descriptor_pool;
    use crate::proto::tiro::speech::v1alpha::{RecognizeResponse, SpeechRecognitionAlternative, SpeechRecognitionResult};

    #[test]
    fn test_reflected_message_matches_generated_encoding() {
        let typed = RecognizeResponse {
            results: vec![SpeechRecognitionResult {
                alternatives: vec![SpeechRecognitionAlternative {
                    transcript: "góðan daginn".to_string(),
                    confidence: 0.5,
                    words: vec![],
                }],
            }],
        };
        let desc = descriptor_pool()
            .unwrap()
            .get_message_by_name("tiro.speech.v1alpha.RecognizeResponse")
            .unwrap();

        let dynamic = DynamicMessage::decode(desc, typed.encode_to_vec().as_slice()).unwrap();
        assert_eq!(dynamic.encode_to_vec(), typed.encode_to_vec());
    }
}
