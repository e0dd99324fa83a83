use clap::{Parser, ValueEnum};
use toprf_core::VerificationPolicy;

/// How the client treats a node whose DLog proof does not verify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Abort the whole evaluation.
    Abort,
    /// Drop the contribution and continue with the others.
    Discard,
}

impl From<PolicyArg> for VerificationPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Abort => VerificationPolicy::Abort,
            PolicyArg::Discard => VerificationPolicy::Discard,
        }
    }
}

/// The configuration for the dev client.
///
/// It can be configured via environment variables or command line arguments using `clap`.
#[derive(Parser, Debug, Clone)]
pub struct DevClientConfig {
    /// The amount of simulated OPRF nodes
    #[clap(long, env = "TOPRF_DEV_CLIENT_NODES", default_value = "5")]
    pub nodes: usize,

    /// The threshold of nodes that need to respond
    #[clap(long, env = "TOPRF_DEV_CLIENT_THRESHOLD", default_value = "3")]
    pub threshold: usize,

    /// The amount of nodes asked per evaluation. Defaults to the threshold
    #[clap(long, env = "TOPRF_DEV_CLIENT_CANDIDATES")]
    pub candidates: Option<usize>,

    /// What to do with contributions carrying an invalid proof
    #[clap(long, env = "TOPRF_DEV_CLIENT_POLICY", value_enum, default_value = "abort")]
    pub policy: PolicyArg,

    /// The amount of simulated nodes returning tampered evaluations
    #[clap(long, env = "TOPRF_DEV_CLIENT_FAULTY", default_value = "0")]
    pub faulty: usize,

    /// The amount of simulated nodes returning undecodable evaluations
    #[clap(long, env = "TOPRF_DEV_CLIENT_CORRUPT", default_value = "0")]
    pub corrupt: usize,

    /// The client input
    #[clap(long, env = "TOPRF_DEV_CLIENT_INPUT", default_value = "hello")]
    pub input: String,

    /// The amount of OPRF runs
    #[clap(long, env = "TOPRF_DEV_CLIENT_RUNS", default_value = "1")]
    pub runs: usize,

    /// Seed for a reproducible run. Uses system entropy if not set
    #[clap(long, env = "TOPRF_DEV_CLIENT_SEED")]
    pub seed: Option<u64>,
}

impl DevClientConfig {
    /// The amount of nodes asked per evaluation.
    pub fn candidates(&self) -> usize {
        self.candidates.unwrap_or(self.threshold)
    }

    /// Checks `1 <= threshold <= candidates <= nodes` and `faulty + corrupt <= nodes`.
    pub fn validate(&self) -> eyre::Result<()> {
        let candidates = self.candidates();
        if self.threshold == 0 {
            eyre::bail!("threshold must be at least 1");
        }
        if self.threshold > candidates {
            eyre::bail!(
                "threshold {} exceeds the amount of candidates {candidates}",
                self.threshold
            );
        }
        if candidates > self.nodes {
            eyre::bail!(
                "cannot ask {candidates} candidates with only {} nodes",
                self.nodes
            );
        }
        if self.faulty + self.corrupt > self.nodes {
            eyre::bail!(
                "cannot have {} faulty and {} corrupt nodes with only {} nodes",
                self.faulty,
                self.corrupt,
                self.nodes
            );
        }
        if u16::try_from(self.nodes).is_err() {
            eyre::bail!("at most {} nodes are supported", u16::MAX);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> DevClientConfig {
        DevClientConfig::try_parse_from(std::iter::once("toprf-dev-client").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.nodes, 5);
        assert_eq!(config.threshold, 3);
        assert_eq!(config.candidates(), 3);
        assert_eq!(config.policy, PolicyArg::Abort);
        assert_eq!(config.faulty, 0);
        assert_eq!(config.corrupt, 0);
        assert_eq!(config.input, "hello");
        assert_eq!(config.runs, 1);
        assert_eq!(config.seed, None);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate() {
        parse(&["--threshold", "0"]).validate().unwrap_err();
        parse(&["--threshold", "4", "--candidates", "3"])
            .validate()
            .unwrap_err();
        parse(&["--candidates", "6"]).validate().unwrap_err();
        parse(&["--faulty", "6"]).validate().unwrap_err();
        parse(&["--faulty", "3", "--corrupt", "3"])
            .validate()
            .unwrap_err();
        parse(&["--nodes", "100", "--threshold", "99"])
            .validate()
            .unwrap();
        let config = parse(&["--policy", "discard", "--candidates", "5", "--faulty", "2"]);
        assert_eq!(VerificationPolicy::from(config.policy), VerificationPolicy::Discard);
        config.validate().unwrap();
    }
}
