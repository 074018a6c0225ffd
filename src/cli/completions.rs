use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    extman completions bash > ~/.bash_completion.d/extman\n\n\
                  Generate zsh completions:\n    extman completions zsh > ~/.zfunc/_extman\n\n\
                  Generate fish completions:\n    extman completions fish > ~/.config/fish/completions/extman.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
