// Error taxonomy. Kinds match the ones enumerated for the core:
// signer errors are programmer-visible (bad key, bad parameters, bad
// message), verifier errors are always caught and turned into `false`.

quick_error! {
    #[derive(Debug, PartialEq, Eq, Clone)]
    pub enum DKIMError {
        KeyFormatError(reason: String) {
            display("key format error: {}", reason)
        }
        MessageFormatError(reason: String) {
            display("RFC822 message format error: {}", reason)
        }
        ParameterError(reason: String) {
            display("parameter error: {}", reason)
        }
        ValidationError(reason: String) {
            display("signature validation error: {}", reason)
        }
        InvalidTagList(reason: String) {
            display("invalid tag-value list: {}", reason)
        }
        InternalError(reason: String) {
            display("internal error: {}", reason)
        }
    }
}
