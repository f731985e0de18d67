use crate::{
    error::NnError,
    param::{ConvParam, FcParam},
};

/// Number of convolutional blocks in the network.
pub const NUM_BLOCKS: usize = 3;

/// Number of input channels of the first block (red, green, blue).
pub const INPUT_CHANNELS: usize = 3;

/// Number of classes scored by the network (background, face).
pub const NUM_CLASSES: usize = 2;

/// The trained parameters of the whole network.
///
/// Three convolution blocks followed by one fully-connected layer. The configuration is
/// validated once at construction and never mutated by the layers reading it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkConfig {
    conv: [ConvParam; NUM_BLOCKS],
    fc: FcParam,
}

impl NetworkConfig {
    /// Create a validated network configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NnError::Config`] if the channel counts of consecutive blocks do not chain,
    /// the first block does not take 3 channels, or the classifier does not produce
    /// 2 outputs.
    pub fn new(conv: [ConvParam; NUM_BLOCKS], fc: FcParam) -> Result<Self, NnError> {
        let config = Self { conv, fc };
        config.validate()?;
        Ok(config)
    }

    /// Check the structural invariants of the configuration.
    ///
    /// `fc.in_features` is not checked here since it depends on the size of the image; the
    /// fully-connected layer checks it against the flattened tensor.
    pub fn validate(&self) -> Result<(), NnError> {
        if self.conv[0].in_channels() != INPUT_CHANNELS {
            return Err(NnError::Config(format!(
                "block 1 must take {INPUT_CHANNELS} input channels, got {}",
                self.conv[0].in_channels()
            )));
        }

        for (i, pair) in self.conv.windows(2).enumerate() {
            if pair[1].in_channels() != pair[0].out_channels() {
                return Err(NnError::Config(format!(
                    "block {} takes {} channels but block {} produces {}",
                    i + 2,
                    pair[1].in_channels(),
                    i + 1,
                    pair[0].out_channels()
                )));
            }
        }

        if self.fc.out_features() != NUM_CLASSES {
            return Err(NnError::Config(format!(
                "classifier must produce {NUM_CLASSES} outputs, got {}",
                self.fc.out_features()
            )));
        }

        Ok(())
    }

    /// The parameters of the three convolution blocks, in execution order.
    #[inline]
    pub fn conv(&self) -> &[ConvParam; NUM_BLOCKS] {
        &self.conv
    }

    /// The parameters of the fully-connected classifier.
    #[inline]
    pub fn fc(&self) -> &FcParam {
        &self.fc
    }

    /// Length of the flattened block 3 output for a `rows x cols` input.
    ///
    /// Returns `None` if the input is too small to survive the three blocks.
    pub fn flattened_len(&self, rows: usize, cols: usize, pool_window: usize) -> Option<usize> {
        Some(
            self.conv[NUM_BLOCKS - 1].out_channels()
                * self.block_output_dim(rows, pool_window)?
                * self.block_output_dim(cols, pool_window)?,
        )
    }

    /// One spatial dimension after the three blocks.
    fn block_output_dim(&self, input_dim: usize, pool_window: usize) -> Option<usize> {
        if pool_window == 0 {
            return None;
        }
        let mut dim = input_dim;
        for (i, conv) in self.conv.iter().enumerate() {
            dim = conv.output_dim(dim)?;
            if i + 1 < NUM_BLOCKS {
                dim /= pool_window;
                if dim == 0 {
                    return None;
                }
            }
        }
        Some(dim)
    }

    /// Load a configuration from a JSON document.
    ///
    /// The document holds a `conv` array of three convolution parameter objects and an `fc`
    /// object. Every parameter set is validated while it is parsed.
    #[cfg(feature = "serde")]
    pub fn from_json_reader<R: std::io::Read>(reader: R) -> Result<Self, NnError> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    #[cfg(feature = "serde")]
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, NnError> {
        let file = std::fs::File::open(path)?;
        Self::from_json_reader(std::io::BufReader::new(file))
    }
}
