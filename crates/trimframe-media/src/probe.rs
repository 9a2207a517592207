// crates/trimframe-media/src/probe.rs
//
// Codec capability probe: which output containers this runtime can record.
// Asked fresh on every call; callers cache if they want to.

use log::debug;

use trimframe_core::{CodecSupport, ContainerFamily};

use crate::host::MediaHost;

/// Test one representative codec string per container family.
///
/// Never fails: a host without a capability API reports nothing recordable.
pub fn check_codec_support(host: &dyn MediaHost) -> CodecSupport {
    let Some(query) = host.capabilities() else {
        debug!("[probe] no capability API, reporting no recordable formats");
        return CodecSupport::default();
    };
    let support = CodecSupport {
        webm: query.is_type_supported(ContainerFamily::WebM.probe_mime()),
        mp4:  query.is_type_supported(ContainerFamily::Mp4.probe_mime()),
    };
    debug!("[probe] webm={} mp4={}", support.webm, support.mp4);
    support
}
