/// RTCSetParameterOptions is defined as an empty dictionary to allow for extensibility.
/// https://www.w3.org/TR/webrtc/#rtcsetparameteroptions-dictionary
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RTCSetParameterOptions {}
