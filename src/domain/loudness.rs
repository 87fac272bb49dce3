use std::fmt::Display;

/// Loudness profile both normalization passes are run against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessTarget {
    /// integrated loudness, LUFS
    pub integrated: f64,
    /// maximum true peak, dBTP
    pub true_peak: f64,
    /// loudness range, LU
    pub range: f64,
}

impl LoudnessTarget {
    pub const STREAMING: LoudnessTarget = LoudnessTarget {
        integrated: -14.0,
        true_peak: -1.5,
        range: 14.0,
    };

    /// `loudnorm` filter arguments for the target alone
    pub fn filter_args(&self) -> String {
        format!(
            "I={}:TP={}:LRA={}",
            self.integrated, self.true_peak, self.range
        )
    }
}

impl Default for LoudnessTarget {
    fn default() -> Self {
        Self::STREAMING
    }
}

/// Statistics measured by the analysis pass.
///
/// Produced once per job and moved into the correction pass, hence not `Clone`.
#[derive(Debug, PartialEq)]
pub struct LoudnessMeasurement {
    /// integrated loudness, LUFS
    pub input_i: f64,
    /// true peak, dBTP
    pub input_tp: f64,
    /// loudness range, LU
    pub input_lra: f64,
    /// gating threshold, LUFS
    pub input_thresh: f64,
    /// offset gain to reach the target, LU
    pub target_offset: f64,
}

impl LoudnessMeasurement {
    /// `loudnorm` arguments feeding the measured values back into the filter
    pub fn filter_args(&self) -> String {
        format!(
            "measured_I={}:measured_TP={}:measured_LRA={}:measured_thresh={}:offset={}",
            self.input_i, self.input_tp, self.input_lra, self.input_thresh, self.target_offset
        )
    }
}

impl Display for LoudnessMeasurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "I={:.2} LUFS, TP={:.2} dBTP, LRA={:.2} LU, thresh={:.2} LUFS, offset={:.2} LU",
            self.input_i, self.input_tp, self.input_lra, self.input_thresh, self.target_offset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streaming_target_filter_args() {
        assert_eq!(LoudnessTarget::STREAMING.filter_args(), "I=-14:TP=-1.5:LRA=14");
    }

    #[test]
    fn measurement_filter_args() {
        let m = LoudnessMeasurement {
            input_i: -23.5,
            input_tp: -4.2,
            input_lra: 7.1,
            input_thresh: -34.0,
            target_offset: 0.25,
        };
        assert_eq!(
            m.filter_args(),
            "measured_I=-23.5:measured_TP=-4.2:measured_LRA=7.1:measured_thresh=-34:offset=0.25"
        );
    }
}
